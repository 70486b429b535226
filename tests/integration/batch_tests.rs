//! Batch cross-check runs against a mock lookup site

use crate::common::{html, mount_lookup, resolver, results_page};
use iban_probe::batch::{
    read_input, run_batch, write_failures, write_results, ColumnMapping, MatchStatus,
};
use iban_probe::config::{BatchConfig, OutputConfig};
use iban_probe::lookup::FailureKind;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

const MATCHING: &str = "RO49AAAA1B31007593840000";
const MISMATCHING: &str = "RO09BBBB0000000000000001";
const SLOW: &str = "RO10CCCC0000000000000002";

const INPUT: &str = "\
Gin,IBAN IN PC,Swift Code in PC,Pc User ID
G-1,RO49 AAAA 1B31 0075 9384 0000,AAAAROBU,u1
G-2,RO09BBBB0000000000000001,AAAAROBU,u2
G-3,,AAAAROBU,u3
G-4,RO10CCCC0000000000000002,CCCCROBU,u4
";

async fn mount_site(mock_server: &MockServer) {
    mount_lookup(
        mock_server,
        MATCHING,
        html(results_page("AAAAROBU", "Example Bank S.A.")),
    )
    .await;
    mount_lookup(
        mock_server,
        MISMATCHING,
        html(results_page("BBBBROBU", "Other Bank S.A.")),
    )
    .await;
    mount_lookup(
        mock_server,
        SLOW,
        html(results_page("CCCCROBU", "Slow Bank S.A.")).set_delay(Duration::from_secs(2)),
    )
    .await;
}

#[tokio::test]
async fn test_cross_check_classifies_every_row() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("input.csv");
    fs::write(&input_path, INPUT).unwrap();

    let config = BatchConfig::default();
    let table = read_input(&input_path, &ColumnMapping::from_config(&config)).unwrap();
    assert_eq!(table.rows.len(), 4);

    let resolver = resolver(&mock_server, Duration::from_millis(500));
    let report = run_batch(&resolver, table.rows).await;

    let statuses: Vec<MatchStatus> = report.rows().iter().map(|r| r.match_status()).collect();
    assert_eq!(
        statuses,
        vec![
            MatchStatus::Match,
            MatchStatus::Mismatch,
            MatchStatus::Skipped,
            MatchStatus::Failed,
        ]
    );
    assert_eq!(report.rows()[1].scraped_swift_code(), Some("BBBBROBU"));

    let summary = report.summary();
    assert_eq!(summary.total, 4);
    assert_eq!(
        summary.matched + summary.mismatched + summary.failed + summary.skipped,
        summary.total
    );

    assert_eq!(report.failures().len(), 1);
    let failure = &report.failures()[0];
    assert_eq!(failure.row_number, 4);
    assert_eq!(failure.identifier, SLOW);
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.reference("Gin"), Some("G-4"));
    assert_eq!(failure.reference("Pc User ID"), Some("u4"));
}

#[tokio::test]
async fn test_manifests_and_retry_run() {
    let mock_server = MockServer::start().await;
    mount_site(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let input_path = dir.path().join("input.csv");
    let results_path = dir.path().join("out").join("results.csv");
    let failures_path = dir.path().join("out").join("failures.csv");
    fs::write(&input_path, INPUT).unwrap();

    let config = BatchConfig::default();
    let table = read_input(&input_path, &ColumnMapping::from_config(&config)).unwrap();
    let resolver = resolver(&mock_server, Duration::from_millis(500));
    let report = run_batch(&resolver, table.rows).await;

    write_results(&results_path, &table.headers, report.rows()).unwrap();
    write_failures(&failures_path, &config.reference_columns, report.failures()).unwrap();

    // Results manifest: original columns first, one line per input row
    let mut reader = csv::Reader::from_path(&results_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "Gin");
    assert_eq!(&headers[4], "Scraped_Swift_Code");
    assert_eq!(&headers[5], "Swift_Codes_Match");
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 4);
    assert_eq!(&records[0][1], "RO49 AAAA 1B31 0075 9384 0000");
    assert_eq!(&records[0][5], "MATCH");
    assert_eq!(&records[1][5], "MISMATCH");
    assert_eq!(&records[2][5], "SKIPPED");
    assert_eq!(&records[3][5], "FAILED");
    assert_eq!(&records[3][12], "transport-error");

    // The site recovers; the retry manifest is fed back in
    mock_server.reset().await;
    mount_lookup(
        &mock_server,
        SLOW,
        html(results_page("CCCCROBU", "Slow Bank S.A.")),
    )
    .await;

    let retry = read_input(&failures_path, &ColumnMapping::retry_manifest(&config)).unwrap();
    assert_eq!(retry.rows.len(), 1);
    assert_eq!(retry.rows[0].reference("Gin"), Some("G-4"));
    assert_eq!(retry.rows[0].row_number, 4);

    let retry_report = run_batch(&resolver, retry.rows).await;
    assert_eq!(retry_report.rows().len(), 1);
    assert_eq!(retry_report.rows()[0].match_status(), MatchStatus::Match);
    assert!(retry_report.failures().is_empty());

    // Retry results land beside the first run's manifest, not over it
    let output = OutputConfig {
        results_path: results_path.to_string_lossy().into_owned(),
        failures_path: failures_path.to_string_lossy().into_owned(),
    };
    let retry_results = output.results_path_for(true);
    assert_eq!(retry_results, dir.path().join("out").join("results_Retry.csv"));
    write_results(&retry_results, &retry.headers, retry_report.rows()).unwrap();

    let first_run = csv::Reader::from_path(&results_path).unwrap().records().count();
    assert_eq!(first_run, 4);

    let mut reader = csv::Reader::from_path(&retry_results).unwrap();
    let retry_headers: Vec<String> =
        reader.headers().unwrap().iter().map(str::to_string).collect();
    assert!(retry_headers.contains(&"Previous_Failure_Kind".to_string()));
    assert_eq!(
        retry_headers.iter().filter(|h| h.as_str() == "Failure_Kind").count(),
        1
    );

    write_failures(&failures_path, &config.reference_columns, retry_report.failures()).unwrap();
    let remaining = read_input(&failures_path, &ColumnMapping::retry_manifest(&config)).unwrap();
    assert!(remaining.rows.is_empty());
}
