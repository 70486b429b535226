//! Summary statistics for cross-check runs
//!
//! Counts are always derived from the completed rows, never tracked
//! separately during the run.

use crate::batch::orchestrator::BatchReport;
use crate::batch::row::{BatchRow, MatchStatus};

/// Number of rows shown in the sample comparison table
const SAMPLE_ROWS: usize = 10;

/// Derived counts for a cross-check run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub mismatched: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    /// Counts rows by match status
    pub fn from_rows(rows: &[BatchRow]) -> Self {
        rows.iter().fold(
            Self {
                total: rows.len(),
                ..Default::default()
            },
            |mut summary, row| {
                match row.match_status() {
                    MatchStatus::Match => summary.matched += 1,
                    MatchStatus::Mismatch => summary.mismatched += 1,
                    MatchStatus::Failed => summary.failed += 1,
                    MatchStatus::Skipped => summary.skipped += 1,
                }
                summary
            },
        )
    }

    /// Rows that went through a resolution attempt
    pub fn attempted(&self) -> usize {
        self.total - self.skipped
    }

    /// Percentage of attempted rows whose codes matched
    pub fn match_rate(&self) -> f64 {
        if self.attempted() == 0 {
            0.0
        } else {
            (self.matched as f64 / self.attempted() as f64) * 100.0
        }
    }
}

/// Prints the run summary to stdout
///
/// # Arguments
///
/// * `report` - The completed run
pub fn print_summary(report: &BatchReport) {
    let summary = report.summary();

    println!("=== Cross-Check Summary ===\n");
    println!("  Rows in input: {}", summary.total);
    println!("  Identifiers processed: {}", summary.attempted());
    println!("  Swift codes matching: {}", summary.matched);
    println!("  Swift codes mismatched: {}", summary.mismatched);
    println!("  Lookup failures: {}", summary.failed);
    println!("  Skipped (no identifier): {}", summary.skipped);
    println!("  Match rate: {:.1}%", summary.match_rate());

    if !report.failures().is_empty() {
        println!("\nFailed identifiers for retry:");
        for (i, failure) in report.failures().iter().enumerate() {
            let references = failure
                .references
                .iter()
                .map(|(name, value)| format!("{}: {}", name, value))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "  {}. Row {}: {} [{}] ({})",
                i + 1,
                failure.row_number,
                failure.identifier,
                failure.kind,
                references
            );
        }
    }

    let sample: Vec<_> = report.rows().iter().take(SAMPLE_ROWS).collect();
    if !sample.is_empty() {
        println!("\nSample cross-check results:");
        println!(
            "  {:<34} {:<12} {:<12} {}",
            "Identifier", "Expected", "Scraped", "Status"
        );
        for row in sample {
            println!(
                "  {:<34} {:<12} {:<12} {}",
                row.input().identifier.as_deref().unwrap_or("-"),
                row.input().expected_code.as_deref().unwrap_or("-"),
                row.scraped_swift_code().unwrap_or("-"),
                row.match_status()
            );
        }
    }
}
