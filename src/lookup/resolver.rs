//! Single-identifier resolution
//!
//! Combines a [`PageFetcher`] with the [`Extractor`] and folds every error
//! into a tagged [`ResolutionOutcome`]. No retries happen here.

use crate::config::LookupConfig;
use crate::identifier::Identifier;
use crate::lookup::extractor::{ExtractError, Extractor};
use crate::lookup::fetcher::{FetchError, HttpFetcher, PageFetcher};
use crate::lookup::record::{FailureKind, ResolutionFailure, ResolutionOutcome};
use crate::ProbeError;
use url::Url;

/// Resolves identifiers to institution records
pub struct Resolver<F = HttpFetcher> {
    fetcher: F,
    extractor: Extractor,
}

impl Resolver<HttpFetcher> {
    /// Builds a resolver backed by a new HTTP client
    ///
    /// The client lives as long as the resolver.
    pub fn from_config(config: &LookupConfig) -> Result<Self, ProbeError> {
        let fetcher = HttpFetcher::from_config(config)?;
        let extractor = Extractor::new(
            Url::parse(&config.base_url)?,
            &config.results_table_selector,
        )?;
        Ok(Self::new(fetcher, extractor))
    }
}

impl<F: PageFetcher> Resolver<F> {
    pub fn new(fetcher: F, extractor: Extractor) -> Self {
        Self { fetcher, extractor }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolves one normalized identifier
    ///
    /// | Cause | Outcome |
    /// |-------|---------|
    /// | Timeout / connection failure | `Failure(transport-error)` |
    /// | HTTP status >= 400 | `Failure(http-error)` |
    /// | Page without any table | `Failure(not-found)` |
    /// | Binary (non-HTML) body | `Failure(parse-error)` |
    /// | Otherwise | `Success`, even if every field is absent |
    pub async fn resolve(&self, identifier: &Identifier) -> ResolutionOutcome {
        let page = match self.fetcher.fetch(identifier).await {
            Ok(page) => page,
            Err(FetchError::Transport {
                url,
                timed_out,
                source,
            }) => {
                let detail = if timed_out {
                    format!("request to {} timed out: {}", url, source)
                } else {
                    format!("request to {} failed: {}", url, source)
                };
                tracing::warn!(identifier = %identifier, "Transport failure: {}", detail);
                return ResolutionOutcome::Failure(ResolutionFailure::new(
                    FailureKind::Transport,
                    detail,
                ));
            }
            Err(FetchError::Http { url, status }) => {
                tracing::warn!(identifier = %identifier, status, "HTTP error from lookup site");
                return ResolutionOutcome::Failure(ResolutionFailure::http(
                    status,
                    format!("HTTP {} for {}", status, url),
                ));
            }
        };

        match self.extractor.extract(&page.body, identifier) {
            Ok(record) => {
                if record.details.is_empty() {
                    tracing::info!(
                    identifier = %identifier,
                    "Lookup page carried no recognized fields"
                );
                } else {
                    tracing::debug!(
                        identifier = %identifier,
                        swift_code = record.swift_code().unwrap_or("-"),
                        "Resolved"
                    );
                }
                ResolutionOutcome::Success(record)
            }
            Err(ExtractError::NoTables) => {
                tracing::info!(identifier = %identifier, "No results table on lookup page");
                ResolutionOutcome::Failure(ResolutionFailure::new(
                    FailureKind::NotFound,
                    format!("no results table at {}", page.url),
                ))
            }
            Err(e) => {
                tracing::error!(identifier = %identifier, "Failed to parse lookup page: {}", e);
                ResolutionOutcome::Failure(ResolutionFailure::new(
                    FailureKind::Parse,
                    e.to_string(),
                ))
            }
        }
    }
}
