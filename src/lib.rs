//! iban-probe: Swift/BIC resolution for IBANs
//!
//! This crate resolves IBANs to institution metadata by querying a public
//! lookup site and extracting fields from its results table. A batch mode
//! cross-checks previously recorded Swift codes against freshly scraped ones
//! and writes a retry manifest for every row that could not be resolved.

pub mod batch;
pub mod config;
pub mod identifier;
pub mod lookup;

use thiserror::Error;

/// Error type for building the lookup pipeline
///
/// Per-identifier lookup failures never surface here; they are reported as
/// [`lookup::ResolutionOutcome::Failure`]. This type covers setup problems
/// that stop a whole run.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Extractor setup error: {0}")]
    Extractor(#[from] lookup::ExtractError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Identifier normalization errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentifierError {
    #[error("identifier is empty after normalization")]
    Empty,
}

// Re-export commonly used types
pub use batch::{run_batch, BatchReport, MatchStatus};
pub use config::Config;
pub use identifier::Identifier;
pub use lookup::{FailureKind, InstitutionRecord, ResolutionOutcome, Resolver};
