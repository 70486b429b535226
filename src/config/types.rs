use crate::lookup::PacingPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for iban-probe
///
/// Every section and key is optional; missing values fall back to the
/// defaults that match the public lookup site and the cross-check sheet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lookup: LookupConfig,
    pub batch: BatchConfig,
    pub output: OutputConfig,
}

/// Lookup site and request pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LookupConfig {
    /// Base URL of the lookup site, also used to absolutize links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path of the lookup page relative to the base URL
    #[serde(rename = "lookup-path")]
    pub lookup_path: String,

    /// Query parameter carrying the identifier
    #[serde(rename = "query-param")]
    pub query_param: String,

    /// Overall timeout per lookup request (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Delay before every lookup request (milliseconds)
    #[serde(rename = "pacing-ms")]
    pub pacing_ms: u64,

    /// CSS selector for the site's results table(s)
    #[serde(rename = "results-table-selector")]
    pub results_table_selector: String,
}

impl LookupConfig {
    /// Overall request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Pacing policy applied before each request
    pub fn pacing(&self) -> PacingPolicy {
        PacingPolicy::fixed(Duration::from_millis(self.pacing_ms))
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bank-code.net".to_string(),
            lookup_path: "/iban-checker".to_string(),
            query_param: "iban".to_string(),
            timeout_secs: 30,
            pacing_ms: 2000,
            results_table_selector: "table.table".to_string(),
        }
    }
}

/// Input column mapping for batch cross-checks
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Column holding the identifier to resolve
    #[serde(rename = "identifier-column")]
    pub identifier_column: String,

    /// Column holding the previously recorded Swift code
    #[serde(rename = "expected-code-column")]
    pub expected_code_column: String,

    /// Columns copied into the retry manifest for each failed row
    #[serde(rename = "reference-columns")]
    pub reference_columns: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            identifier_column: "IBAN IN PC".to_string(),
            expected_code_column: "Swift Code in PC".to_string(),
            reference_columns: vec!["Gin".to_string(), "Pc User ID".to_string()],
        }
    }
}

/// Output manifest locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the full results manifest
    #[serde(rename = "results-path")]
    pub results_path: String,

    /// Path of the retry manifest (failed rows only)
    #[serde(rename = "failures-path")]
    pub failures_path: String,
}

impl OutputConfig {
    /// Results manifest path for a run
    ///
    /// Retry runs write next to the full manifest (`<stem>_Retry.<ext>`)
    /// instead of replacing it.
    pub fn results_path_for(&self, retry: bool) -> PathBuf {
        let path = Path::new(&self.results_path);
        if !retry {
            return path.to_path_buf();
        }

        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match path.extension() {
            Some(ext) => format!("{}_Retry.{}", stem, ext.to_string_lossy()),
            None => format!("{}_Retry", stem),
        };
        path.with_file_name(name)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "Swift_Code_CrossCheck_Results.csv".to_string(),
            failures_path: "Failed_IBANs_for_Manual_Retry.csv".to_string(),
        }
    }
}
