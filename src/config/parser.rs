use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use iban_probe::config::load_config;
///
/// let config = load_config(Path::new("probe.toml")).unwrap();
/// println!("Lookup site: {}", config.lookup.base_url);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a results manifest can be traced back to the exact
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_full_config() {
        let config_content = r#"
[lookup]
base-url = "https://lookup.example.com"
lookup-path = "/check"
query-param = "account"
timeout-secs = 10
pacing-ms = 1500
results-table-selector = "table.results"

[batch]
identifier-column = "IBAN"
expected-code-column = "BIC"
reference-columns = ["Customer"]

[output]
results-path = "out/results.csv"
failures-path = "out/failures.csv"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.lookup.base_url, "https://lookup.example.com");
        assert_eq!(config.lookup.query_param, "account");
        assert_eq!(config.lookup.timeout_secs, 10);
        assert_eq!(config.lookup.pacing_ms, 1500);
        assert_eq!(config.batch.identifier_column, "IBAN");
        assert_eq!(config.batch.reference_columns, vec!["Customer".to_string()]);
        assert_eq!(config.output.failures_path, "out/failures.csv");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();

        assert_eq!(config.lookup.base_url, "https://bank-code.net");
        assert_eq!(config.lookup.lookup_path, "/iban-checker");
        assert_eq!(config.lookup.timeout_secs, 30);
        assert_eq!(config.lookup.pacing_ms, 2000);
        assert_eq!(config.batch.identifier_column, "IBAN IN PC");
        assert_eq!(config.batch.expected_code_column, "Swift Code in PC");
        assert_eq!(config.batch.reference_columns.len(), 2);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse_config("[lookup]\npacing-ms = 5000\n").unwrap();

        assert_eq!(config.lookup.pacing_ms, 5000);
        assert_eq!(config.lookup.query_param, "iban");
        assert_eq!(config.lookup.results_table_selector, "table.table");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/probe.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[lookup]\npacing-ms = 200\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("[lookup]\n");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("[lookup]\npacing-ms = 1000\n");
        let file2 = create_temp_config("[lookup]\npacing-ms = 3000\n");

        let (_, hash1) = load_config_with_hash(file1.path()).unwrap();
        let (_, hash2) = load_config_with_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }
}
