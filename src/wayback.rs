//! Web-archive snapshot-index (CDX) lookups.
//!
//! Asks the index for every recorded snapshot of a tenant hostname,
//! collapsed to unique calendar days, and keeps the earliest and latest.
//! A 429 from the index triggers a bounded backoff-and-retry of the same
//! hostname; once the retry budget is spent, the lookup settles on null
//! dates so the record is marked checked and the pipeline keeps moving.

use anyhow::{Context, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::rate_limit::RetryPolicy;

/// Earliest and latest archived snapshot days for a hostname. Both `None`
/// means "checked, no archive history" - a valid, final answer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnapshotRange {
    pub first: Option<String>,
    pub last: Option<String>,
}

pub struct WaybackClient {
    client: reqwest::Client,
    endpoint: String,
    retry: RetryPolicy,
}

impl WaybackClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build archive-index HTTP client")?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            retry,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.wayback.endpoint.clone(),
            Duration::from_secs(config.wayback.request_timeout_secs),
            RetryPolicy::new(
                config.wayback.max_attempts,
                Duration::from_secs(config.wayback.rate_limit_backoff_secs),
            ),
        )
    }

    /// Look up the snapshot range for a hostname. Never fails: transient
    /// errors are retried under the policy, persistent ones settle on null
    /// dates.
    pub async fn lookup(&self, host: &str) -> SnapshotRange {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.query(host).await {
                Ok(range) => return range,
                Err(e) => {
                    if !self.retry.can_retry(attempt) {
                        warn!("Archive lookup for {} failed after {} attempts: {}", host, attempt, e);
                        return SnapshotRange::default();
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!("Archive lookup for {} failed ({}), retrying in {:?}", host, e, delay);
                    sleep(delay).await;
                }
            }
        }
    }

    async fn query(&self, host: &str) -> Result<SnapshotRange> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", host),
                ("output", "json"),
                ("fl", "timestamp"),
                ("collapse", "timestamp:8"),
            ])
            .send()
            .await
            .with_context(|| format!("Archive index request failed for {}", host))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            anyhow::bail!("Archive index rate limited (429)");
        }

        if !response.status().is_success() {
            // A hard non-200 is not worth the retry budget; no history is
            // the recorded answer.
            debug!("Archive index returned {} for {}", response.status(), host);
            return Ok(SnapshotRange::default());
        }

        let body = response
            .text()
            .await
            .context("Failed to read archive index response")?;
        parse_cdx_response(&body)
    }
}

/// Parse a CDX JSON response: an array of rows whose first row is a column
/// header. Header-only (or empty) responses mean no archive history.
pub fn parse_cdx_response(body: &str) -> Result<SnapshotRange> {
    let rows: Vec<Vec<String>> =
        serde_json::from_str(body).context("Malformed archive index response")?;

    if rows.len() <= 1 {
        return Ok(SnapshotRange::default());
    }

    let timestamps: Vec<&str> = rows[1..]
        .iter()
        .filter_map(|row| row.first().map(String::as_str))
        .collect();

    Ok(SnapshotRange {
        first: timestamps.first().and_then(|ts| format_snapshot_day(ts)),
        last: timestamps.last().and_then(|ts| format_snapshot_day(ts)),
    })
}

/// Convert a compact snapshot timestamp (`YYYYMMDDhhmmss`) to `YYYY-MM-DD`.
pub fn format_snapshot_day(timestamp: &str) -> Option<String> {
    if timestamp.len() < 8 || !timestamp.chars().take(8).all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!(
        "{}-{}-{}",
        &timestamp[0..4],
        &timestamp[4..6],
        &timestamp[6..8]
    ))
}
