//! iban-probe main entry point
//!
//! This is the command-line interface for single lookups and batch
//! cross-checks against the lookup site.

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use iban_probe::batch::{
    inspect_table, print_overview, print_summary, read_input, run_batch, write_failures,
    write_results, ColumnMapping,
};
use iban_probe::config::{load_config_with_hash, validate, Config};
use iban_probe::lookup::{FailureKind, ResolutionOutcome, Resolver};
use iban_probe::Identifier;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Number of sample values shown per column by `inspect`
const INSPECT_SAMPLES: usize = 3;

/// iban-probe: Swift/BIC resolution for IBANs
///
/// Resolves IBANs against a public lookup site, one request at a time, and
/// cross-checks previously recorded Swift codes against the scraped ones.
#[derive(Parser, Debug)]
#[command(name = "iban-probe")]
#[command(version = "1.0.0")]
#[command(about = "Swift/BIC lookups and cross-checks for IBANs", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long, global = true, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a single IBAN and print the result as JSON
    Lookup {
        /// The IBAN to resolve (spaces allowed)
        iban: String,
    },

    /// Cross-check every row of an input CSV
    Batch {
        /// Input CSV
        #[arg(short, long)]
        input: PathBuf,

        /// Results manifest path (overrides config; retry runs default to `<results>_Retry`)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Retry manifest path (overrides config)
        #[arg(short, long)]
        failures: Option<PathBuf>,

        /// Treat the input as a retry manifest from a previous run
        #[arg(long)]
        retry: bool,
    },

    /// Show the shape and sample values of an input CSV
    Inspect {
        /// Input CSV
        input: PathBuf,
    },

    /// Validate the configuration and print the effective settings
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(cli.config.as_deref())?;

    match cli.command {
        Command::Lookup { iban } => handle_lookup(&config, &iban).await,
        Command::Batch {
            input,
            output,
            failures,
            retry,
        } => {
            handle_batch(&config, &input, output, failures, retry).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Inspect { input } => {
            let overview = inspect_table(&input, INSPECT_SAMPLES)
                .with_context(|| format!("failed to read {}", input.display()))?;
            print_overview(&overview);
            Ok(ExitCode::SUCCESS)
        }
        Command::CheckConfig => {
            handle_check_config(&config, cli.config.as_deref());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that `lookup` output stays machine-readable.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("iban_probe=info,warn"),
            1 => EnvFilter::new("iban_probe=debug,info"),
            2 => EnvFilter::new("iban_probe=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or validated defaults when none is given
fn load(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            tracing::debug!("Using built-in configuration");
            Ok(config)
        }
    }
}

/// Handles `lookup`: prints one JSON document and maps the outcome to an exit code
async fn handle_lookup(config: &Config, raw: &str) -> anyhow::Result<ExitCode> {
    let identifier = Identifier::normalize(raw).context("no IBAN given")?;
    let resolver = Resolver::from_config(&config.lookup)?;

    let outcome = resolver.resolve(&identifier).await;

    let (document, code) = match &outcome {
        ResolutionOutcome::Success(record) => (
            json!({
                "success": true,
                "iban": identifier,
                "swift_bic_code": record.details.swift_code,
                "swift_url": record.details.swift_url,
                "bank_name": record.details.bank_name,
                "country": record.details.country,
                "city": record.details.city,
                "branch": record.details.branch,
                "address": record.details.address,
                "scraped_at": record.resolved_at.to_rfc3339(),
            }),
            ExitCode::SUCCESS,
        ),
        ResolutionOutcome::Failure(failure) => {
            let code = if failure.kind == FailureKind::NotFound {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            };
            (
                json!({
                    "success": false,
                    "error": failure.kind.as_str(),
                    "message": failure.detail,
                    "iban": identifier,
                    "failed_at": Utc::now().to_rfc3339(),
                }),
                code,
            )
        }
    };

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(code)
}

/// Handles `batch`: cross-checks the input and writes both manifests
async fn handle_batch(
    config: &Config,
    input: &Path,
    output: Option<PathBuf>,
    failures: Option<PathBuf>,
    retry: bool,
) -> anyhow::Result<()> {
    let mapping = if retry {
        ColumnMapping::retry_manifest(&config.batch)
    } else {
        ColumnMapping::from_config(&config.batch)
    };
    let results_path = output.unwrap_or_else(|| config.output.results_path_for(retry));
    let failures_path = failures.unwrap_or_else(|| PathBuf::from(&config.output.failures_path));

    if results_path == failures_path {
        anyhow::bail!(
            "results and failures manifests must differ: {}",
            results_path.display()
        );
    }
    if results_path == input {
        anyhow::bail!(
            "results manifest would overwrite the input: {}",
            input.display()
        );
    }

    tracing::info!("Reading input from: {}", input.display());
    let table = read_input(input, &mapping)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let resolver = Resolver::from_config(&config.lookup)?;
    tracing::info!(
        "Lookup site: {}{} (pacing {}ms, timeout {}s)",
        config.lookup.base_url,
        config.lookup.lookup_path,
        config.lookup.pacing_ms,
        config.lookup.timeout_secs
    );

    let report = run_batch(&resolver, table.rows).await;

    write_results(&results_path, &table.headers, report.rows())
        .with_context(|| format!("failed to write {}", results_path.display()))?;
    tracing::info!("Results written to: {}", results_path.display());

    write_failures(
        &failures_path,
        &config.batch.reference_columns,
        report.failures(),
    )
    .with_context(|| format!("failed to write {}", failures_path.display()))?;
    tracing::info!(
        "{} failed rows written to: {}",
        report.failures().len(),
        failures_path.display()
    );

    print_summary(&report);
    Ok(())
}

/// Handles `check-config`: shows the effective configuration
fn handle_check_config(config: &Config, path: Option<&Path>) {
    println!("=== iban-probe Configuration ===\n");
    match path {
        Some(path) => println!("Source: {}\n", path.display()),
        None => println!("Source: built-in defaults\n"),
    }

    println!("Lookup:");
    println!("  Base URL: {}", config.lookup.base_url);
    println!("  Lookup path: {}", config.lookup.lookup_path);
    println!("  Query parameter: {}", config.lookup.query_param);
    println!("  Timeout: {}s", config.lookup.timeout_secs);
    println!("  Pacing: {}ms", config.lookup.pacing_ms);
    println!("  Results table: {}", config.lookup.results_table_selector);

    println!("\nBatch columns:");
    println!("  Identifier: {}", config.batch.identifier_column);
    println!("  Expected code: {}", config.batch.expected_code_column);
    println!("  References: {}", config.batch.reference_columns.join(", "));

    println!("\nOutput:");
    println!("  Results: {}", config.output.results_path);
    println!("  Failures: {}", config.output.failures_path);

    println!("\n✓ Configuration is valid");
}
