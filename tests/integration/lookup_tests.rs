//! Single-identifier resolution against a mock lookup site

use crate::common::{html, mount_lookup, resolver, results_page, LOOKUP_PATH};
use iban_probe::config::LookupConfig;
use iban_probe::lookup::{
    build_http_client, resolve_one, Extractor, FailureKind, HttpFetcher, PacingPolicy, Resolver,
};
use iban_probe::Identifier;
use std::time::{Duration, Instant};
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IBAN: &str = "RO49AAAA1B31007593840000";

fn iban() -> Identifier {
    Identifier::normalize(IBAN).unwrap()
}

#[tokio::test]
async fn test_lookup_sends_browser_headers_and_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .and(query_param("iban", IBAN))
        .and(header(
            "user-agent",
            "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0",
        ))
        .and(header(
            "referer",
            "https://www.google.com/search?q=iban+checker",
        ))
        .and(header("cache-control", "no-cache"))
        .and(header("pragma", "no-cache"))
        .and(header("upgrade-insecure-requests", "1"))
        .respond_with(html(results_page("AAAAROBU", "Example Bank S.A.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = resolver(&mock_server, Duration::from_secs(5));
    let outcome = resolver.resolve(&iban()).await;

    let record = outcome.record().expect("lookup should succeed");
    assert_eq!(record.source_identifier, iban());
    assert_eq!(record.details.swift_code.as_deref(), Some("AAAAROBU"));
    assert_eq!(
        record.details.swift_url.as_deref(),
        Some(format!("{}/swift-code/AAAAROBU", mock_server.uri()).as_str())
    );
    assert_eq!(record.details.bank_name.as_deref(), Some("Example Bank S.A."));
    assert_eq!(record.details.country.as_deref(), Some("Romania"));
    assert_eq!(record.details.city.as_deref(), Some("Bucharest"));
    assert_eq!(record.details.branch.as_deref(), Some("Head Office"));
    assert_eq!(record.details.address.as_deref(), Some("Str. Exemplu 1"));
}

#[tokio::test]
async fn test_http_404_is_http_error() {
    let mock_server = MockServer::start().await;
    mount_lookup(&mock_server, IBAN, ResponseTemplate::new(404)).await;

    let resolver = resolver(&mock_server, Duration::from_secs(5));
    let outcome = resolver.resolve(&iban()).await;

    let failure = outcome.failure().expect("404 should fail");
    assert_eq!(failure.kind, FailureKind::Http);
    assert_eq!(failure.status_code, Some(404));
}

#[tokio::test]
async fn test_page_without_tables_is_not_found() {
    let mock_server = MockServer::start().await;
    mount_lookup(
        &mock_server,
        IBAN,
        html("<html><body><p>No results for this IBAN.</p></body></html>"),
    )
    .await;

    let resolver = resolver(&mock_server, Duration::from_secs(5));
    let outcome = resolver.resolve(&iban()).await;

    assert_eq!(outcome.failure_kind(), Some(FailureKind::NotFound));
}

#[tokio::test]
async fn test_unrelated_tables_yield_empty_success() {
    let mock_server = MockServer::start().await;
    mount_lookup(
        &mock_server,
        IBAN,
        html(r#"<table class="layout"><tr><td>Swift Code</td><td>ZZZZROBU</td></tr></table>"#),
    )
    .await;

    let resolver = resolver(&mock_server, Duration::from_secs(5));
    let outcome = resolver.resolve(&iban()).await;

    let record = outcome.record().expect("tables present means success");
    assert!(record.details.is_empty());
}

#[tokio::test]
async fn test_declared_charset_is_decoded() {
    let mock_server = MockServer::start().await;

    let mut body = results_page("BTRLRO22", "Banca Transilvania").into_bytes();
    let city = body
        .windows(b"Bucharest".len())
        .position(|w| w == b"Bucharest")
        .unwrap();
    // "Timi\u{15F}oara" in ISO-8859-2
    body.splice(
        city..city + b"Bucharest".len(),
        b"Timi\xBAoara".iter().copied(),
    );

    mount_lookup(
        &mock_server,
        IBAN,
        ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=iso-8859-2"),
    )
    .await;

    let resolver = resolver(&mock_server, Duration::from_secs(5));
    let outcome = resolver.resolve(&iban()).await;

    let record = outcome.record().expect("page in its declared charset is readable");
    assert_eq!(record.swift_code(), Some("BTRLRO22"));
    assert_eq!(record.details.city.as_deref(), Some("Timi\u{15F}oara"));
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let mock_server = MockServer::start().await;
    mount_lookup(
        &mock_server,
        IBAN,
        html(results_page("AAAAROBU", "Example Bank S.A.")).set_delay(Duration::from_secs(2)),
    )
    .await;

    let resolver = resolver(&mock_server, Duration::from_millis(200));
    let outcome = resolver.resolve(&iban()).await;

    let failure = outcome.failure().expect("slow response should time out");
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.status_code, None);
}

#[tokio::test]
async fn test_pacing_applies_before_request() {
    let mock_server = MockServer::start().await;
    mount_lookup(
        &mock_server,
        IBAN,
        html(results_page("AAAAROBU", "Example Bank S.A.")),
    )
    .await;

    let base = Url::parse(&mock_server.uri()).unwrap();
    let fetcher = HttpFetcher::new(
        build_http_client(Duration::from_secs(5)).unwrap(),
        base.join(LOOKUP_PATH).unwrap(),
        "iban",
        PacingPolicy::fixed(Duration::from_millis(300)),
    );
    let extractor = Extractor::new(base, Extractor::DEFAULT_TABLE_SELECTOR).unwrap();
    let resolver = Resolver::new(fetcher, extractor);

    let start = Instant::now();
    let outcome = resolver.resolve(&iban()).await;

    assert!(outcome.is_success());
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_resolve_one_from_config() {
    let mock_server = MockServer::start().await;
    mount_lookup(
        &mock_server,
        IBAN,
        html(results_page("AAAAROBU", "Example Bank S.A.")),
    )
    .await;

    let config = LookupConfig {
        base_url: mock_server.uri(),
        timeout_secs: 5,
        pacing_ms: 0,
        ..LookupConfig::default()
    };

    let identifier = Identifier::normalize("ro49 aaaa 1b31 0075 9384 0000").unwrap();
    let outcome = resolve_one(&config, &identifier).await.unwrap();

    assert_eq!(
        outcome.record().and_then(|r| r.swift_code()),
        Some("AAAAROBU")
    );
}
