//! HTTP fetcher for the lookup site
//!
//! This module handles every request sent to the lookup site:
//! - Building the HTTP client with the fixed browser header set
//! - Building the lookup URL for an identifier
//! - Applying the pacing delay before each request
//! - Decoding the body from its declared charset
//! - Classifying failures into transport errors and HTTP errors

use crate::config::LookupConfig;
use crate::identifier::Identifier;
use crate::lookup::pacing::PacingPolicy;
use crate::ProbeError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Boxed error preserving the underlying transport cause
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Header set sent with every lookup request
///
/// The site serves its results table to ordinary browser traffic; these
/// values reproduce a desktop Firefox hit arriving from a search page.
pub const BROWSER_HEADERS: [(&str, &str); 9] = [
    (
        "user-agent",
        "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0",
    ),
    (
        "accept",
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
    ),
    ("accept-language", "en-US,en;q=0.5"),
    ("accept-encoding", "gzip, deflate"),
    ("connection", "keep-alive"),
    ("upgrade-insecure-requests", "1"),
    ("referer", "https://www.google.com/search?q=iban+checker"),
    ("cache-control", "no-cache"),
    ("pragma", "no-cache"),
];

/// Errors returned by a page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection-level failure or timeout; no usable response
    #[error("transport error for {url}: {source}")]
    Transport {
        url: String,
        timed_out: bool,
        #[source]
        source: BoxError,
    },

    /// The site answered with an error status
    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },
}

impl FetchError {
    /// The URL that was requested
    pub fn url(&self) -> &str {
        match self {
            Self::Transport { url, .. } | Self::Http { url, .. } => url,
        }
    }
}

/// A successfully fetched lookup page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The requested URL
    pub url: String,

    /// HTTP status code (always < 400)
    pub status_code: u16,

    /// Response body, transcoded to UTF-8 from the declared charset
    pub body: Vec<u8>,
}

/// Source of lookup pages
///
/// [`HttpFetcher`] is the production implementation; tests substitute canned
/// pages or failures.
pub trait PageFetcher {
    fn fetch(
        &self,
        identifier: &Identifier,
    ) -> impl Future<Output = Result<FetchedPage, FetchError>> + Send;
}

/// Builds the header map from [`BROWSER_HEADERS`]
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(BROWSER_HEADERS.len());
    for (name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// Builds an HTTP client for lookup requests
///
/// # Arguments
///
/// * `timeout` - Overall timeout per request, covering connect and body read
///
/// # Example
///
/// ```no_run
/// use iban_probe::lookup::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .default_headers(browser_headers())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .build()
}

/// Fetches lookup pages over HTTP
///
/// Owns the process's single HTTP client; drop the fetcher to release it.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    lookup_url: Url,
    query_param: String,
    pacing: PacingPolicy,
}

impl HttpFetcher {
    /// Creates a fetcher around an existing client
    pub fn new(
        client: Client,
        lookup_url: Url,
        query_param: impl Into<String>,
        pacing: PacingPolicy,
    ) -> Self {
        Self {
            client,
            lookup_url,
            query_param: query_param.into(),
            pacing,
        }
    }

    /// Creates a fetcher from configuration, building its own client
    pub fn from_config(config: &LookupConfig) -> Result<Self, ProbeError> {
        let client = build_http_client(config.timeout())?;
        let lookup_url = Url::parse(&config.base_url)?.join(&config.lookup_path)?;
        Ok(Self::new(
            client,
            lookup_url,
            config.query_param.clone(),
            config.pacing(),
        ))
    }

    /// Builds the lookup URL for an identifier
    pub fn lookup_url(&self, identifier: &Identifier) -> Url {
        let mut url = self.lookup_url.clone();
        url.query_pairs_mut()
            .append_pair(&self.query_param, identifier.as_str());
        url
    }

    fn transport_error(url: &Url, error: reqwest::Error) -> FetchError {
        let timed_out = error.is_timeout();
        if timed_out {
            tracing::warn!("Request timeout for {}", url);
        } else if error.is_connect() {
            tracing::warn!("Connection failed for {}: {}", url, error);
        } else {
            tracing::warn!("Request failed for {}: {}", url, error);
        }

        FetchError::Transport {
            url: url.to_string(),
            timed_out,
            source: Box::new(error),
        }
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, identifier: &Identifier) -> Result<FetchedPage, FetchError> {
        let url = self.lookup_url(identifier);

        self.pacing.wait().await;

        tracing::debug!("Fetching {}", url);
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| Self::transport_error(&url, e))?;

        let status = response.status();
        if status.as_u16() >= 400 {
            tracing::warn!(status = status.as_u16(), "Lookup rejected for {}", identifier);
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // Decoded with the Content-Type charset, falling back to UTF-8
        let body = response
            .text_with_charset("utf-8")
            .await
            .map_err(|e| Self::transport_error(&url, e))?;

        tracing::debug!(
            status = status.as_u16(),
            bytes = body.len(),
            "Lookup page received for {}",
            identifier
        );

        Ok(FetchedPage {
            url: url.to_string(),
            status_code: status.as_u16(),
            body: body.into_bytes(),
        })
    }
}
