//! The batch driver: one parameterized pipeline over the file store.
//!
//! A phase selects the records it still needs (idempotence lives in the
//! `needs` predicate, never in the lookup itself) and enriches them in
//! fixed-size windows. All lookups within a window run concurrently and are
//! joined before the store is persisted; the next window never starts until
//! the previous one is on disk, so an interrupted run loses at most one
//! window of completed work.

use anyhow::Result;
use futures::future::join_all;
use std::time::Duration;
use tokio::time::sleep;

use crate::logger::ProgressLogger;
use crate::name_resolver::{BrowserResolver, NameResolver};
use crate::record::Record;
use crate::store::JsonStore;
use crate::validator::DomainValidator;
use crate::wayback::WaybackClient;

/// One enrichment phase, pluggable into `run_phase`.
#[allow(async_fn_in_trait)]
pub trait Phase {
    fn name(&self) -> &'static str;

    /// Whether a record still needs this phase. Records failing this
    /// predicate are skipped entirely, which is what makes re-runs no-ops.
    fn needs(&self, record: &Record) -> bool;

    /// Enrich one record. Lookup failures must be swallowed and leave the
    /// record unchanged (or stamped as checked, per the phase's contract);
    /// they never abort the window.
    async fn enrich(&self, record: Record) -> Record;
}

/// Per-phase tallies, reported after every window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseReport {
    pub total: usize,
    pub processed: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// Run a phase to completion over the store, persisting after every window.
pub async fn run_phase<P: Phase>(
    store: &mut JsonStore,
    phase: &P,
    window_size: usize,
    window_delay: Duration,
    logger: &ProgressLogger,
) -> Result<PhaseReport> {
    let pending: Vec<usize> = store
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| phase.needs(r))
        .map(|(i, _)| i)
        .collect();

    let mut report = PhaseReport {
        total: pending.len(),
        ..PhaseReport::default()
    };

    logger.info(&format!("{} records need {}", report.total, phase.name()));
    if pending.is_empty() {
        return Ok(report);
    }

    logger.start_progress(report.total as u64, phase.name());

    let windows: Vec<&[usize]> = pending.chunks(window_size).collect();
    let window_count = windows.len();

    for (window_num, window) in windows.into_iter().enumerate() {
        let mut lookups = Vec::with_capacity(window.len());
        for &i in window {
            let record = store.records[i].clone();
            lookups.push(async move { (i, phase.enrich(record).await) });
        }

        for (i, record) in join_all(lookups).await {
            if phase.needs(&record) {
                report.failed += 1;
            } else {
                report.enriched += 1;
            }
            store.records[i] = record;
        }

        store.persist()?;
        report.processed += window.len();
        logger.advance(window.len() as u64);

        let pct = report.processed * 100 / report.total;
        logger.detail(&format!(
            "[{}/{}] {}% - Enriched: {}, Failed: {}",
            report.processed, report.total, pct, report.enriched, report.failed
        ));

        if window_num + 1 < window_count {
            sleep(window_delay).await;
        }
    }

    logger.finish_progress(&format!(
        "Done! {}: enriched {}, failed {}",
        phase.name(),
        report.enriched,
        report.failed
    ));

    Ok(report)
}

/// School-name resolution over plain HTTP.
pub struct NamePhase<'a> {
    pub resolver: &'a NameResolver,
}

impl Phase for NamePhase<'_> {
    fn name(&self) -> &'static str {
        "name enrichment"
    }

    fn needs(&self, record: &Record) -> bool {
        record.needs_name()
    }

    async fn enrich(&self, mut record: Record) -> Record {
        if let Some(name) = self.resolver.resolve(&record.subdomain).await {
            record.school_name = Some(name);
        }
        record
    }
}

/// School-name resolution through the shared headless browser.
pub struct BrowserNamePhase<'a> {
    pub resolver: BrowserResolver<'a>,
}

impl Phase for BrowserNamePhase<'_> {
    fn name(&self) -> &'static str {
        "name enrichment (browser)"
    }

    fn needs(&self, record: &Record) -> bool {
        record.needs_name()
    }

    async fn enrich(&self, mut record: Record) -> Record {
        if let Some(name) = self.resolver.resolve(&record.subdomain) {
            record.school_name = Some(name);
        }
        record
    }
}

/// Liveness validation of both candidate hostnames.
pub struct ValidatePhase<'a> {
    pub validator: &'a DomainValidator,
}

impl Phase for ValidatePhase<'_> {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn needs(&self, record: &Record) -> bool {
        record.needs_validation()
    }

    async fn enrich(&self, mut record: Record) -> Record {
        let outcome = self.validator.validate(&record.subdomain).await;
        record.apply_validation(outcome.typingclub_valid, outcome.edclub_valid);
        record
    }
}

/// Archive snapshot-range lookup against the primary hosting domain.
pub struct WaybackPhase<'a> {
    pub client: &'a WaybackClient,
    pub host_domain: String,
}

impl Phase for WaybackPhase<'_> {
    fn name(&self) -> &'static str {
        "wayback enrichment"
    }

    fn needs(&self, record: &Record) -> bool {
        record.needs_wayback()
    }

    async fn enrich(&self, mut record: Record) -> Record {
        let host = format!("{}.{}", record.subdomain, self.host_domain);
        let range = self.client.lookup(&host).await;
        record.apply_wayback(range.first, range.last);
        record
    }
}
