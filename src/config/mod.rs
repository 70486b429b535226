//! Configuration module for iban-probe
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a run without a config file targets the public
//! lookup site with the original cross-check sheet's column names.
//!
//! # Example
//!
//! ```no_run
//! use iban_probe::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("probe.toml")).unwrap();
//! println!("Pacing: {}ms", config.lookup.pacing_ms);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BatchConfig, Config, LookupConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
