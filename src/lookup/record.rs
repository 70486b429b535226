//! Resolution result types
//!
//! A lookup either yields an [`InstitutionRecord`] (possibly with every field
//! absent) or a [`ResolutionFailure`] tagged with a [`FailureKind`].

use crate::identifier::Identifier;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Fields extracted from the lookup site's results table
///
/// A field is `None` when no matching row was found on the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BankDetails {
    /// Swift/BIC code
    pub swift_code: Option<String>,

    /// Absolute URL of the Swift code's detail page, when the cell linked one
    pub swift_url: Option<String>,

    pub bank_name: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub branch: Option<String>,
    pub address: Option<String>,
}

impl BankDetails {
    /// Number of institution fields present (the auxiliary URL is not counted)
    pub fn field_count(&self) -> usize {
        [
            &self.swift_code,
            &self.bank_name,
            &self.country,
            &self.city,
            &self.branch,
            &self.address,
        ]
        .iter()
        .filter(|field| field.is_some())
        .count()
    }

    /// Returns true if the page yielded no institution fields at all
    pub fn is_empty(&self) -> bool {
        self.field_count() == 0
    }
}

/// Institution metadata resolved for one identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstitutionRecord {
    /// The identifier that was looked up
    pub source_identifier: Identifier,

    /// Wall-clock time the page was parsed
    pub resolved_at: DateTime<Utc>,

    #[serde(flatten)]
    pub details: BankDetails,
}

impl InstitutionRecord {
    /// The scraped Swift/BIC code, if the page carried one
    pub fn swift_code(&self) -> Option<&str> {
        self.details.swift_code.as_deref()
    }
}

/// Classification of a failed resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Connection failure or timeout; retryable
    Transport,

    /// The site answered with a status >= 400
    Http,

    /// The document could not be read as HTML
    Parse,

    /// The page carried no results table
    NotFound,
}

impl FailureKind {
    /// Stable string form used in manifests and CLI output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport-error",
            Self::Http => "http-error",
            Self::Parse => "parse-error",
            Self::NotFound => "not-found",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed resolution with its diagnostic detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub kind: FailureKind,

    /// HTTP status for [`FailureKind::Http`]
    pub status_code: Option<u16>,

    /// Human-readable cause
    pub detail: String,
}

impl ResolutionFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            detail: detail.into(),
        }
    }

    pub fn http(status_code: u16, detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Http,
            status_code: Some(status_code),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Result of resolving one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Success(InstitutionRecord),
    Failure(ResolutionFailure),
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn record(&self) -> Option<&InstitutionRecord> {
        match self {
            Self::Success(record) => Some(record),
            Self::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ResolutionFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }
}
