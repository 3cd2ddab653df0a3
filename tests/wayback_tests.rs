//! Integration tests for the archive snapshot-index client: response
//! parsing against a live mock server, rate-limit retry behavior, and the
//! forward-progress guarantee on persistent failures.

mod common;

use std::time::Duration;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edclub_enricher::rate_limit::RetryPolicy;
use edclub_enricher::wayback::{SnapshotRange, WaybackClient};

fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(10))
}

fn client_for(server: &MockServer) -> WaybackClient {
    WaybackClient::new(server.uri(), Duration::from_secs(5), fast_retry()).unwrap()
}

#[tokio::test]
async fn test_lookup_returns_first_and_last_days() {
    let server = common::mock_cdx_server(vec![
        "20190304123000",
        "20210630000000",
        "20240115070000",
    ])
    .await;

    let client = client_for(&server);
    let range = client.lookup("lincoln.typingclub.com").await;

    assert_eq!(range.first, Some("2019-03-04".to_string()));
    assert_eq!(range.last, Some("2024-01-15".to_string()));
}

#[tokio::test]
async fn test_header_only_response_is_final_no_history() {
    let server = common::mock_cdx_server(vec![]).await;

    let client = client_for(&server);
    let range = client.lookup("ghost.typingclub.com").await;

    assert_eq!(range, SnapshotRange::default());
}

#[tokio::test]
async fn test_lookup_sends_collapse_and_url_params() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("url", "lincoln.typingclub.com"))
        .and(query_param("output", "json"))
        .and(query_param("fl", "timestamp"))
        .and(query_param("collapse", "timestamp:8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![vec!["timestamp"]]))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client.lookup("lincoln.typingclub.com").await;
}

#[tokio::test]
async fn test_rate_limit_waits_then_retries_same_host() {
    let server = MockServer::start().await;

    // First request is rate limited; the retry succeeds.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(vec![vec!["timestamp"], vec!["20190304123000"]]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let range = client.lookup("lincoln.typingclub.com").await;

    // Not a permanent null: the retry recovered the dates.
    assert_eq!(range.first, Some("2019-03-04".to_string()));
    assert_eq!(range.last, Some("2019-03-04".to_string()));
}

#[tokio::test]
async fn test_rate_limit_budget_is_bounded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let range = client.lookup("lincoln.typingclub.com").await;

    // Budget exhausted: the record settles on null dates so the pipeline
    // keeps moving.
    assert_eq!(range, SnapshotRange::default());
}

#[tokio::test]
async fn test_hard_error_status_records_no_history() {
    let server = common::mock_status_server(503).await;

    let client = client_for(&server);
    let range = client.lookup("lincoln.typingclub.com").await;

    assert_eq!(range, SnapshotRange::default());
}

#[tokio::test]
async fn test_unreachable_index_settles_after_retries() {
    // Bind-then-drop guarantees nothing is listening on the port.
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = WaybackClient::new(uri, Duration::from_millis(500), fast_retry()).unwrap();
    let range = client.lookup("lincoln.typingclub.com").await;

    assert_eq!(range, SnapshotRange::default());
}
