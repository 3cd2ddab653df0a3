//! Integration tests for the liveness probe: status semantics, redirect
//! following, and error degradation.

mod common;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use edclub_enricher::config::{AppConfig, DEFAULT_CONFIG};
use edclub_enricher::validator::DomainValidator;

fn test_config() -> AppConfig {
    let mut config: AppConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
    config.http.probe_timeout_secs = 1;
    config
}

fn validator() -> DomainValidator {
    DomainValidator::new(&test_config()).unwrap()
}

#[tokio::test]
async fn test_probe_accepts_exact_200() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(validator().probe(&format!("{}/", server.uri())).await);
}

#[tokio::test]
async fn test_probe_rejects_404() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert!(!validator().probe(&format!("{}/", server.uri())).await);
}

#[tokio::test]
async fn test_probe_rejects_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!validator().probe(&format!("{}/", server.uri())).await);
}

#[tokio::test]
async fn test_probe_follows_redirects() {
    let server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/login"),
        )
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    assert!(validator().probe(&format!("{}/", server.uri())).await);
}

#[tokio::test]
async fn test_probe_degrades_on_connection_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    assert!(!validator().probe(&format!("{}/", uri)).await);
}

#[tokio::test]
async fn test_probe_degrades_on_timeout() {
    // Probe timeout is 1s; the server answers after 2s.
    let server = common::mock_timeout_server(2000).await;

    assert!(!validator().probe(&format!("{}/", server.uri())).await);
}
