//! Batch module for cross-check runs
//!
//! This module contains:
//! - Input rows and their verdicts
//! - The sequential orchestrator
//! - CSV manifests (input, results, retry)
//! - Run summaries

mod manifest;
mod orchestrator;
mod row;
mod stats;

pub use manifest::{
    inspect_table, inspect_table_from, print_overview, read_input, read_input_from,
    write_failures, write_failures_to, write_results, write_results_to, ColumnMapping,
    ColumnPreview, InputTable, ManifestError, ManifestResult, TableOverview,
    PREVIOUS_COLUMN_PREFIX, RESULT_COLUMNS, RETRY_EXPECTED_CODE_COLUMN, RETRY_IDENTIFIER_COLUMN,
    RETRY_ROW_INDEX_COLUMN, TIMESTAMP_FORMAT,
};
pub use orchestrator::{BatchReport, Orchestrator};
pub use row::{BatchInput, BatchRow, FailureEntry, MatchStatus};
pub use stats::{print_summary, BatchSummary};

use crate::lookup::{PageFetcher, Resolver};

/// Runs a cross-check over `inputs` with a shared resolver
///
/// Rows are resolved one at a time in input order; the report holds exactly
/// one row per input.
pub async fn run_batch<F: PageFetcher>(
    resolver: &Resolver<F>,
    inputs: Vec<BatchInput>,
) -> BatchReport {
    Orchestrator::new(resolver).run(inputs).await
}
