//! Long-running enrichment worker against the remote store.
//!
//! Loops forever: validation windows take priority (they are cheap), archive
//! lookups run one record at a time under the index's stricter rate limits,
//! and when neither finds work the worker idles for a long interval before
//! re-checking - new subdomains may have been imported in the meantime.
//! There is no shutdown hook; every completed step is already persisted
//! remotely, so killing the process is the supported way to stop it.

use anyhow::Result;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::remote::RemoteStore;
use crate::validator::DomainValidator;
use crate::wayback::WaybackClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Validating,
    EnrichingArchive,
    Idle,
}

pub struct Worker<'a> {
    store: &'a RemoteStore,
    validator: &'a DomainValidator,
    wayback: &'a WaybackClient,
    host_domain: String,
    validate_window: usize,
    validate_delay: Duration,
    wayback_delay: Duration,
    idle_sleep: Duration,
}

impl<'a> Worker<'a> {
    pub fn new(
        store: &'a RemoteStore,
        validator: &'a DomainValidator,
        wayback: &'a WaybackClient,
        config: &AppConfig,
    ) -> Self {
        Self {
            store,
            validator,
            wayback,
            host_domain: config.domains.primary.clone(),
            validate_window: config.phases.validate.window_size,
            validate_delay: Duration::from_millis(config.worker.validate_delay_ms),
            wayback_delay: Duration::from_millis(config.worker.wayback_delay_ms),
            idle_sleep: Duration::from_secs(config.worker.idle_sleep_secs),
        }
    }

    /// Run forever. Fatal errors are not expected inside the loop: every
    /// phase swallows its own failures and reports them as "no work".
    pub async fn run(&self) -> Result<()> {
        info!("Enrichment worker starting");

        loop {
            match self.store.stats().await {
                Ok(stats) => info!("Progress: {}", stats),
                Err(e) => warn!("Stats query failed: {}", e),
            }

            match self.tick().await {
                WorkerPhase::Validating => sleep(self.validate_delay).await,
                WorkerPhase::EnrichingArchive => {}
                WorkerPhase::Idle => {
                    info!(
                        "All enrichment complete, sleeping {}s",
                        self.idle_sleep.as_secs()
                    );
                    sleep(self.idle_sleep).await;
                }
            }
        }
    }

    /// One scheduler tick: try a validation window, then a single archive
    /// lookup, and report which phase made progress.
    pub async fn tick(&self) -> WorkerPhase {
        match self.validate_window().await {
            Ok(n) if n > 0 => return WorkerPhase::Validating,
            Ok(_) => {}
            Err(e) => warn!("Validation window failed: {}", e),
        }

        match self.wayback_step().await {
            Ok(true) => return WorkerPhase::EnrichingArchive,
            Ok(false) => {}
            Err(e) => warn!("Archive step failed: {}", e),
        }

        WorkerPhase::Idle
    }

    async fn validate_window(&self) -> Result<usize> {
        let rows = self.store.pending_validation(self.validate_window).await?;
        if rows.is_empty() {
            return Ok(0);
        }

        info!("Validating batch of {}", rows.len());

        let updates = rows.iter().map(|row| async {
            let outcome = self.validator.validate(&row.subdomain).await;
            if let Err(e) = self.store.apply_validation(row.id, &outcome).await {
                warn!("Failed to persist validation for {}: {}", row.subdomain, e);
            }
        });
        join_all(updates).await;

        Ok(rows.len())
    }

    /// Process exactly one unchecked record, respecting the archive index's
    /// stricter rate limits.
    async fn wayback_step(&self) -> Result<bool> {
        let rows = self.store.pending_wayback(1).await?;
        let Some(row) = rows.first() else {
            return Ok(false);
        };

        info!("Wayback: {}", row.subdomain);

        let host = format!("{}.{}", row.subdomain, self.host_domain);
        let range = self.wayback.lookup(&host).await;
        self.store.apply_wayback(row.id, &range).await?;

        sleep(self.wayback_delay).await;
        Ok(true)
    }
}
