//! Shared fixtures for integration tests

use iban_probe::lookup::{build_http_client, Extractor, HttpFetcher, PacingPolicy, Resolver};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const LOOKUP_PATH: &str = "/iban-checker";

/// Builds a resolver pointed at the mock server, with no pacing
pub fn resolver(server: &MockServer, timeout: Duration) -> Resolver<HttpFetcher> {
    let base = Url::parse(&server.uri()).expect("mock server uri");
    let client = build_http_client(timeout).expect("client");
    let fetcher = HttpFetcher::new(
        client,
        base.join(LOOKUP_PATH).expect("lookup url"),
        "iban",
        PacingPolicy::none(),
    );
    let extractor =
        Extractor::new(base, Extractor::DEFAULT_TABLE_SELECTOR).expect("default selector");
    Resolver::new(fetcher, extractor)
}

/// A results page in the lookup site's layout
pub fn results_page(swift_code: &str, bank_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>IBAN Checker</title></head>
<body>
  <table class="table">
    <tr><th>IBAN</th><td>valid</td></tr>
    <tr><th>Bank Code</th><td>0001</td></tr>
    <tr><th>Bank</th><td>{bank_name}</td></tr>
    <tr><th>Swift Code</th><td><a href="/swift-code/{swift_code}">{swift_code}</a></td></tr>
    <tr><th>Country</th><td>Romania</td></tr>
    <tr><th>City</th><td>Bucharest</td></tr>
    <tr><th>Branch</th><td>Head Office</td></tr>
    <tr><th>Address</th><td>Str. Exemplu 1</td></tr>
  </table>
</body>
</html>"#
    )
}

/// Mounts a lookup response for one identifier
pub async fn mount_lookup(server: &MockServer, iban: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(LOOKUP_PATH))
        .and(query_param("iban", iban))
        .respond_with(response)
        .mount(server)
        .await;
}

/// A 200 response carrying an HTML body
pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.into())
        .insert_header("content-type", "text/html; charset=utf-8")
}
