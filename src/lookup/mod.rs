//! Lookup module for resolving identifiers against the lookup site
//!
//! This module contains the resolution engine, including:
//! - Request pacing
//! - HTTP fetching with the fixed browser header set
//! - Field extraction from the results table
//! - Resolution into tagged outcomes

mod extractor;
mod fetcher;
mod pacing;
mod record;
mod resolver;

pub use extractor::{ExtractError, Extractor};
pub use fetcher::{
    browser_headers, build_http_client, BoxError, FetchError, FetchedPage, HttpFetcher,
    PageFetcher, BROWSER_HEADERS,
};
pub use pacing::PacingPolicy;
pub use record::{
    BankDetails, FailureKind, InstitutionRecord, ResolutionFailure, ResolutionOutcome,
};
pub use resolver::Resolver;

use crate::config::LookupConfig;
use crate::identifier::Identifier;
use crate::ProbeError;

/// Resolves a single identifier using a freshly built resolver
///
/// Convenient for one-off lookups; batch runs should build one [`Resolver`]
/// and reuse it so the HTTP client is shared.
pub async fn resolve_one(
    config: &LookupConfig,
    identifier: &Identifier,
) -> Result<ResolutionOutcome, ProbeError> {
    let resolver = Resolver::from_config(config)?;
    Ok(resolver.resolve(identifier).await)
}
