//! Batch row definitions for cross-check runs
//!
//! Each input row is resolved at most once. A [`BatchRow`] is built from the
//! input and its single outcome and is never mutated afterward.

use crate::identifier::Identifier;
use crate::lookup::{FailureKind, InstitutionRecord, ResolutionOutcome};
use chrono::{DateTime, Utc};
use std::fmt;

/// One input row of a cross-check run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    /// 1-based position in the input table (excluding the header)
    pub row_number: usize,

    /// Raw identifier cell; `None` when the cell is missing or blank
    pub identifier: Option<String>,

    /// Previously recorded Swift code; `None` when missing or blank
    pub expected_code: Option<String>,

    /// Reference columns copied into the retry manifest, in configured order
    pub references: Vec<(String, String)>,

    /// Every original cell, aligned with the input header
    pub values: Vec<String>,
}

impl BatchInput {
    /// Creates an input row with no passthrough columns
    pub fn new(
        row_number: usize,
        identifier: impl Into<String>,
        expected_code: impl Into<String>,
    ) -> Self {
        let identifier = identifier.into();
        let expected_code = expected_code.into();
        Self {
            row_number,
            identifier: non_blank(&identifier),
            expected_code: non_blank(&expected_code),
            references: Vec::new(),
            values: vec![identifier, expected_code],
        }
    }

    /// Adds a reference column
    pub fn with_reference(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.references.push((column.into(), value.into()));
        self
    }

    /// Looks up a reference column's value
    pub fn reference(&self, column: &str) -> Option<&str> {
        self.references
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

/// Returns `Some` for a cell carrying anything besides whitespace
pub(crate) fn non_blank(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Cross-check verdict for a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchStatus {
    /// Scraped Swift code equals the expected code
    Match,

    /// Resolution succeeded but the codes differ (or the page had no code)
    Mismatch,

    /// Resolution failed; the row is in the retry manifest
    Failed,

    /// No identifier; never resolved
    Skipped,
}

impl MatchStatus {
    /// String form written to the results manifest
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Match => "MATCH",
            Self::Mismatch => "MISMATCH",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
        }
    }

    /// Compares codes by exact string equality
    ///
    /// A missing code on either side never matches.
    pub fn compare(expected: Option<&str>, scraped: Option<&str>) -> Self {
        match (expected, scraped) {
            (Some(expected), Some(scraped)) if expected == scraped => Self::Match,
            _ => Self::Mismatch,
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed row of a cross-check run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRow {
    input: BatchInput,
    identifier: Option<Identifier>,
    outcome: Option<ResolutionOutcome>,
    match_status: MatchStatus,
    processed_at: Option<DateTime<Utc>>,
}

impl BatchRow {
    /// A row that was not resolved because it has no identifier
    pub fn skipped(input: BatchInput) -> Self {
        Self {
            input,
            identifier: None,
            outcome: None,
            match_status: MatchStatus::Skipped,
            processed_at: None,
        }
    }

    /// A row with its single resolution outcome
    pub fn resolved(input: BatchInput, identifier: Identifier, outcome: ResolutionOutcome) -> Self {
        let match_status = match &outcome {
            ResolutionOutcome::Success(record) => {
                MatchStatus::compare(input.expected_code.as_deref(), record.swift_code())
            }
            ResolutionOutcome::Failure(_) => MatchStatus::Failed,
        };

        Self {
            input,
            identifier: Some(identifier),
            outcome: Some(outcome),
            match_status,
            processed_at: Some(Utc::now()),
        }
    }

    pub fn input(&self) -> &BatchInput {
        &self.input
    }

    /// The normalized identifier that was resolved
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn outcome(&self) -> Option<&ResolutionOutcome> {
        self.outcome.as_ref()
    }

    pub fn match_status(&self) -> MatchStatus {
        self.match_status
    }

    /// When the resolution attempt finished
    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    /// The extracted record, for successful rows
    pub fn record(&self) -> Option<&InstitutionRecord> {
        self.outcome.as_ref().and_then(ResolutionOutcome::record)
    }

    pub fn scraped_swift_code(&self) -> Option<&str> {
        self.record().and_then(InstitutionRecord::swift_code)
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.outcome.as_ref().and_then(ResolutionOutcome::failure_kind)
    }
}

/// Retry manifest entry for a failed row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureEntry {
    pub row_number: usize,

    /// Identifier exactly as it appeared in the input
    pub identifier: String,

    pub expected_code: Option<String>,
    pub references: Vec<(String, String)>,
    pub kind: FailureKind,
    pub detail: String,
    pub failed_at: DateTime<Utc>,
}

impl FailureEntry {
    /// Builds the retry entry for a failed row, `None` for any other row
    pub fn from_row(row: &BatchRow) -> Option<Self> {
        let failure = row.outcome()?.failure()?;
        Some(Self {
            row_number: row.input.row_number,
            identifier: row.input.identifier.clone().unwrap_or_default(),
            expected_code: row.input.expected_code.clone(),
            references: row.input.references.clone(),
            kind: failure.kind,
            detail: failure.detail.clone(),
            failed_at: row.processed_at.unwrap_or_else(Utc::now),
        })
    }

    /// Looks up a reference column's value
    pub fn reference(&self, column: &str) -> Option<&str> {
        self.references
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}
