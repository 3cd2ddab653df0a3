// Shared wiremock helpers for the integration suites. Not every suite uses
// every helper.
#![allow(dead_code)]

use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a mock archive-index (CDX) server that answers snapshot queries
/// for any URL with the given compact timestamps, prefixed by the header row.
pub async fn mock_cdx_server(timestamps: Vec<&str>) -> MockServer {
    let server = MockServer::start().await;

    let mut rows: Vec<Vec<String>> = vec![vec!["timestamp".to_string()]];
    rows.extend(timestamps.iter().map(|ts| vec![ts.to_string()]));

    Mock::given(method("GET"))
        .and(query_param("output", "json"))
        .and(query_param("fl", "timestamp"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(rows)
                .insert_header("content-type", "application/json"),
        )
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server that serves HTML content at the root path.
/// Useful for testing tenant page fetching and name extraction.
pub async fn mock_tenant_page(html: &str) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html.to_string())
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server that returns the specified status code for
/// every request.
pub async fn mock_status_server(status_code: u16) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status_code))
        .mount(&server)
        .await;

    server
}

/// Creates a mock HTTP server that delays responses to simulate network
/// timeouts. The server waits `delay_ms` before responding 200.
pub async fn mock_timeout_server(delay_ms: u64) -> MockServer {
    let server = MockServer::start().await;

    Mock::given(wiremock::matchers::any())
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("delayed response")
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(&server)
        .await;

    server
}
