//! Service-mode record store: a remote table behind a PostgREST-style API.
//!
//! The table mirrors the file-mode record with snake_case columns plus a
//! synthetic `id`, supports select-with-filter-and-limit, update-by-id and
//! upsert-by-subdomain, and exposes a precomputed `domain_stats` view. The
//! base URL and key come from the `SUPABASE_URL` / `SUPABASE_KEY`
//! environment variables.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use crate::record::{Record, ValidDomains};
use crate::validator::ValidationOutcome;
use crate::wayback::SnapshotRange;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One row of the remote `domains` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub subdomain: String,
    pub school_name: Option<String>,
    pub source: String,
    pub typingclub_valid: Option<bool>,
    pub edclub_valid: Option<bool>,
    pub valid_domains: Option<ValidDomains>,
    pub validated_at: Option<DateTime<Utc>>,
    pub wayback_first: Option<String>,
    pub wayback_last: Option<String>,
    pub wayback_checked_at: Option<DateTime<Utc>>,
}

impl RemoteRow {
    /// Map a file-mode record onto the remote schema. Legacy stores carry
    /// derived fields without their timestamps; the timestamps are
    /// reconstructed from field presence so resume filters keep working.
    pub fn from_record(record: &Record) -> Self {
        let validated_at = record
            .validated_at
            .or_else(|| record.valid_domains.map(|_| Utc::now()));
        let wayback_checked_at = record
            .wayback_checked_at
            .or_else(|| record.wayback_first.as_ref().map(|_| Utc::now()));

        Self {
            id: None,
            subdomain: record.subdomain.clone(),
            school_name: record.school_name.clone().filter(|n| !n.is_empty()),
            source: record.source.clone(),
            typingclub_valid: record.typingclub_valid,
            edclub_valid: record.edclub_valid,
            valid_domains: record.valid_domains,
            validated_at,
            wayback_first: record.wayback_first.clone(),
            wayback_last: record.wayback_last.clone(),
            wayback_checked_at,
        }
    }
}

/// Minimal row shape for work selection.
#[derive(Debug, Clone, Deserialize)]
pub struct PendingRow {
    pub id: i64,
    pub subdomain: String,
}

/// The precomputed aggregate view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteStats {
    pub total: i64,
    pub validated: i64,
    pub wayback_enriched: i64,
}

impl std::fmt::Display for RemoteStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} validated, {} wayback",
            self.validated, self.total, self.wayback_enriched
        )
    }
}

pub struct RemoteStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RemoteStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build remote store HTTP client")?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .context("SUPABASE_URL environment variable is not set")?;
        let key = std::env::var("SUPABASE_KEY")
            .context("SUPABASE_KEY environment variable is not set")?;
        Self::new(url, key)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Rows that have not been validated yet, oldest first, up to `limit`.
    pub async fn pending_validation(&self, limit: usize) -> Result<Vec<PendingRow>> {
        self.pending("validated_at", limit).await
    }

    /// Rows whose archive check has not run yet, up to `limit`.
    pub async fn pending_wayback(&self, limit: usize) -> Result<Vec<PendingRow>> {
        self.pending("wayback_checked_at", limit).await
    }

    async fn pending(&self, null_column: &str, limit: usize) -> Result<Vec<PendingRow>> {
        let response = self
            .request(reqwest::Method::GET, "/rest/v1/domains")
            .query(&[
                ("select", "id,subdomain"),
                (null_column, "is.null"),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await
            .context("Remote store select failed")?;

        if !response.status().is_success() {
            bail!("Remote store select returned {}", response.status());
        }

        response
            .json::<Vec<PendingRow>>()
            .await
            .context("Malformed remote store select response")
    }

    /// Write a validation outcome onto a row by id.
    pub async fn apply_validation(&self, id: i64, outcome: &ValidationOutcome) -> Result<()> {
        self.patch(
            id,
            json!({
                "typingclub_valid": outcome.typingclub_valid,
                "edclub_valid": outcome.edclub_valid,
                "valid_domains": outcome.valid_domains,
                "validated_at": Utc::now(),
            }),
        )
        .await
    }

    /// Write an archive-check result onto a row by id.
    pub async fn apply_wayback(&self, id: i64, range: &SnapshotRange) -> Result<()> {
        self.patch(
            id,
            json!({
                "wayback_first": range.first,
                "wayback_last": range.last,
                "wayback_checked_at": Utc::now(),
            }),
        )
        .await
    }

    async fn patch(&self, id: i64, body: serde_json::Value) -> Result<()> {
        let response = self
            .request(reqwest::Method::PATCH, "/rest/v1/domains")
            .query(&[("id", format!("eq.{}", id))])
            .json(&body)
            .send()
            .await
            .context("Remote store update failed")?;

        if !response.status().is_success() {
            bail!("Remote store update returned {}", response.status());
        }
        Ok(())
    }

    /// Upsert rows by subdomain (the unique key). Used by the one-shot
    /// import; existing rows are merged, not duplicated.
    pub async fn upsert(&self, rows: &[RemoteRow]) -> Result<()> {
        let response = self
            .request(reqwest::Method::POST, "/rest/v1/domains")
            .query(&[("on_conflict", "subdomain")])
            .header("Prefer", "resolution=merge-duplicates")
            .json(&rows)
            .send()
            .await
            .context("Remote store upsert failed")?;

        if !response.status().is_success() {
            bail!("Remote store upsert returned {}", response.status());
        }
        Ok(())
    }

    /// Read the aggregate progress view.
    pub async fn stats(&self) -> Result<RemoteStats> {
        let response = self
            .request(reqwest::Method::GET, "/rest/v1/domain_stats")
            .query(&[("select", "*")])
            .send()
            .await
            .context("Remote store stats query failed")?;

        if !response.status().is_success() {
            bail!("Remote store stats query returned {}", response.status());
        }

        let rows: Vec<RemoteStats> = response
            .json()
            .await
            .context("Malformed remote store stats response")?;

        Ok(rows.into_iter().next().unwrap_or_default())
    }
}
