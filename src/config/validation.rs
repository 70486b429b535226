use crate::config::types::{BatchConfig, Config, LookupConfig, OutputConfig};
use crate::ConfigError;
use scraper::Selector;
use std::path::Path;
use url::Url;

/// Shortest allowed delay between lookup requests
const MIN_PACING_MS: u64 = 1000;

/// Upper bound on the per-request timeout
const MAX_TIMEOUT_SECS: u64 = 300;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_lookup_config(&config.lookup)?;
    validate_batch_config(&config.batch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates lookup site configuration
fn validate_lookup_config(config: &LookupConfig) -> Result<(), ConfigError> {
    let base_url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if base_url.scheme() != "http" && base_url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            base_url.scheme()
        )));
    }

    if !config.lookup_path.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "lookup-path must start with '/', got '{}'",
            config.lookup_path
        )));
    }

    if config.query_param.trim().is_empty() {
        return Err(ConfigError::Validation(
            "query-param cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be between 1 and {}, got {}",
            MAX_TIMEOUT_SECS, config.timeout_secs
        )));
    }

    if config.pacing_ms < MIN_PACING_MS {
        return Err(ConfigError::Validation(format!(
            "pacing-ms must be >= {}ms, got {}ms",
            MIN_PACING_MS, config.pacing_ms
        )));
    }

    Selector::parse(&config.results_table_selector).map_err(|e| {
        ConfigError::Validation(format!(
            "results-table-selector '{}' is not a valid CSS selector: {}",
            config.results_table_selector, e
        ))
    })?;

    Ok(())
}

/// Validates the batch column mapping
fn validate_batch_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.identifier_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "identifier-column cannot be empty".to_string(),
        ));
    }

    if config.expected_code_column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "expected-code-column cannot be empty".to_string(),
        ));
    }

    if let Some(blank) = config.reference_columns.iter().find(|c| c.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "reference-columns cannot contain blank names, got '{}'",
            blank
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.results_path.is_empty() {
        return Err(ConfigError::Validation(
            "results-path cannot be empty".to_string(),
        ));
    }

    if config.failures_path.is_empty() {
        return Err(ConfigError::Validation(
            "failures-path cannot be empty".to_string(),
        ));
    }

    if config.results_path == config.failures_path {
        return Err(ConfigError::Validation(format!(
            "results-path and failures-path must differ, both are '{}'",
            config.results_path
        )));
    }

    if config.results_path_for(true) == Path::new(&config.failures_path) {
        return Err(ConfigError::Validation(format!(
            "failures-path '{}' collides with the retry results manifest",
            config.failures_path
        )));
    }

    Ok(())
}
