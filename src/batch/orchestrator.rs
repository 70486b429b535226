//! Batch orchestrator - sequential cross-check runs
//!
//! Drives every input row through the [`Resolver`] strictly in input order,
//! one lookup at a time. Pacing lives in the fetcher, so the loop itself never
//! sleeps. A failing row never stops the run.

use crate::batch::row::{BatchInput, BatchRow, FailureEntry, MatchStatus};
use crate::batch::stats::BatchSummary;
use crate::identifier::Identifier;
use crate::lookup::{PageFetcher, Resolver};
use std::time::Instant;

/// Interval (in resolved rows) between progress reports
const PROGRESS_INTERVAL: usize = 25;

/// Completed cross-check run
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    rows: Vec<BatchRow>,
    failures: Vec<FailureEntry>,
}

impl BatchReport {
    /// Every row, in input order
    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    /// Retry manifest entries, in input order
    pub fn failures(&self) -> &[FailureEntry] {
        &self.failures
    }

    /// Counts derived from the rows
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_rows(&self.rows)
    }

    pub fn into_parts(self) -> (Vec<BatchRow>, Vec<FailureEntry>) {
        (self.rows, self.failures)
    }
}

/// Runs cross-check batches against a resolver
pub struct Orchestrator<'a, F> {
    resolver: &'a Resolver<F>,
}

impl<'a, F: PageFetcher> Orchestrator<'a, F> {
    pub fn new(resolver: &'a Resolver<F>) -> Self {
        Self { resolver }
    }

    /// Processes every input row and returns the report
    ///
    /// The report always holds exactly one row per input, in input order.
    pub async fn run(&self, inputs: Vec<BatchInput>) -> BatchReport {
        let total = inputs.len();
        let start_time = Instant::now();
        tracing::info!("Starting cross-check of {} rows", total);

        let mut rows = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut resolved = 0usize;

        for (index, input) in inputs.into_iter().enumerate() {
            let row = self.process(index + 1, total, input).await;

            if row.match_status() != MatchStatus::Skipped {
                resolved += 1;
                if resolved % PROGRESS_INTERVAL == 0 {
                    tracing::info!(
                        "Progress: {}/{} rows, {} failures so far, {:.1}s elapsed",
                        index + 1,
                        total,
                        failures.len(),
                        start_time.elapsed().as_secs_f64()
                    );
                }
            }

            if let Some(entry) = FailureEntry::from_row(&row) {
                failures.push(entry);
            }
            rows.push(row);
        }

        let report = BatchReport { rows, failures };
        let summary = report.summary();
        tracing::info!(
            matched = summary.matched,
            mismatched = summary.mismatched,
            failed = summary.failed,
            skipped = summary.skipped,
            "Cross-check completed: {} rows in {:?}",
            summary.total,
            start_time.elapsed()
        );

        report
    }

    /// Resolves one row
    async fn process(&self, position: usize, total: usize, input: BatchInput) -> BatchRow {
        let identifier = match input.identifier.as_deref().map(Identifier::normalize) {
            Some(Ok(identifier)) => identifier,
            _ => {
                tracing::debug!("Skipping row {}: no identifier", input.row_number);
                return BatchRow::skipped(input);
            }
        };

        tracing::info!(
            expected = input.expected_code.as_deref().unwrap_or("-"),
            "Processing {}/{}: {}",
            position,
            total,
            identifier
        );

        let outcome = self.resolver.resolve(&identifier).await;
        let row = BatchRow::resolved(input, identifier, outcome);

        match row.match_status() {
            MatchStatus::Match => {
                tracing::info!("Row {}: match", row.input().row_number);
            }
            MatchStatus::Mismatch => {
                tracing::warn!(
                    expected = row.input().expected_code.as_deref().unwrap_or("-"),
                    scraped = row.scraped_swift_code().unwrap_or("-"),
                    "Row {}: mismatch",
                    row.input().row_number
                );
            }
            MatchStatus::Failed => {
                tracing::warn!(
                    kind = row.failure_kind().map(|k| k.as_str()).unwrap_or("-"),
                    "Row {}: failed, queued for retry",
                    row.input().row_number
                );
            }
            MatchStatus::Skipped => {}
        }

        row
    }
}
