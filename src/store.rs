//! File-mode record store: a single JSON document holding an array of
//! records keyed by subdomain.
//!
//! The store object is the only mutation entry point for the record set.
//! Persistence rewrites the whole file through a temp-file-then-rename so an
//! interrupted run can never leave a half-written document behind; the last
//! persisted window is always recoverable.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::record::{Record, ValidDomains};

pub struct JsonStore {
    path: PathBuf,
    pub records: Vec<Record>,
}

impl JsonStore {
    /// Load the store from disk. A missing file starts an empty store;
    /// malformed JSON is a warning, not a fatal error, so a botched manual
    /// edit never blocks enrichment.
    pub fn load(path: &Path) -> Result<Self> {
        let records = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read record store: {}", path.display()))?;
            match serde_json::from_str::<Vec<Record>>(&content) {
                Ok(records) => records,
                Err(e) => {
                    warn!("Record store {} is malformed ({}), starting fresh", path.display(), e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    /// Persist the full record set using atomic write
    /// (write to temp file, then rename to prevent corruption on interrupt)
    pub fn persist(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.records)
            .context("Failed to serialize record store")?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&temp_path).with_context(|| {
                format!("Failed to create temp store file: {}", temp_path.display())
            })?;
            file.write_all(content.as_bytes())?;
            file.sync_all()?;
        }

        std::fs::rename(&temp_path, &self.path).with_context(|| {
            format!("Failed to move temp store file into place: {}", self.path.display())
        })?;

        Ok(())
    }

    /// Create records for subdomains not yet present. Existing records are
    /// never touched; returns how many were added.
    pub fn import_subdomains(&mut self, subdomains: &[String]) -> usize {
        let known: HashSet<String> =
            self.records.iter().map(|r| r.subdomain.clone()).collect();

        let mut added = 0;
        for sub in subdomains {
            if !known.contains(sub) {
                self.records.push(Record::new(sub.clone()));
                added += 1;
            }
        }
        added
    }

    pub fn get(&self, subdomain: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.subdomain == subdomain)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Aggregate progress counts across the store.
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats {
            total: self.records.len(),
            ..StoreStats::default()
        };

        for r in &self.records {
            if !r.needs_name() {
                stats.named += 1;
            }
            if !r.needs_validation() {
                stats.validated += 1;
            }
            if !r.needs_wayback() {
                stats.wayback_checked += 1;
            }
            match r.valid_domains {
                Some(ValidDomains::Both) => stats.both += 1,
                Some(ValidDomains::Typingclub) => stats.typingclub_only += 1,
                Some(ValidDomains::Edclub) => stats.edclub_only += 1,
                Some(ValidDomains::None) => stats.dead += 1,
                None => {}
            }
        }

        stats
    }
}

/// Aggregate counts for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    pub total: usize,
    pub named: usize,
    pub validated: usize,
    pub wayback_checked: usize,
    pub both: usize,
    pub typingclub_only: usize,
    pub edclub_only: usize,
    pub dead: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Records:          {}", self.total)?;
        writeln!(f, "With school name: {}", self.named)?;
        writeln!(f, "Validated:        {}", self.validated)?;
        writeln!(f, "  TypingClub only: {}", self.typingclub_only)?;
        writeln!(f, "  EdClub only:     {}", self.edclub_only)?;
        writeln!(f, "  Both domains:    {}", self.both)?;
        writeln!(f, "  Neither (dead):  {}", self.dead)?;
        write!(f, "Wayback checked:  {}", self.wayback_checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(tmp: &TempDir) -> PathBuf {
        tmp.path().join("enriched-data.json")
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonStore::load(&store_path(&tmp)).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_malformed_json_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = store_path(&tmp);
        std::fs::write(&path, "{not valid json").unwrap();

        let store = JsonStore::load(&path).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = store_path(&tmp);

        let mut store = JsonStore::load(&path).unwrap();
        store.import_subdomains(&["alpha".to_string(), "beta".to_string()]);
        store.persist().unwrap();

        let reloaded = JsonStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.get("alpha").is_some());
        assert!(reloaded.get("beta").is_some());
    }

    #[test]
    fn test_persist_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = store_path(&tmp);

        let mut store = JsonStore::load(&path).unwrap();
        store.import_subdomains(&["alpha".to_string()]);
        store.persist().unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_import_never_touches_existing_records() {
        let tmp = TempDir::new().unwrap();
        let path = store_path(&tmp);

        let mut store = JsonStore::load(&path).unwrap();
        store.import_subdomains(&["alpha".to_string()]);
        store.records[0].school_name = Some("Alpha Academy".to_string());
        store.persist().unwrap();

        let mut reloaded = JsonStore::load(&path).unwrap();
        let added = reloaded.import_subdomains(&["alpha".to_string(), "gamma".to_string()]);

        assert_eq!(added, 1);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(
            reloaded.get("alpha").unwrap().school_name.as_deref(),
            Some("Alpha Academy")
        );
    }

    #[test]
    fn test_stats_tallies() {
        let tmp = TempDir::new().unwrap();
        let mut store = JsonStore::load(&store_path(&tmp)).unwrap();
        store.import_subdomains(&[
            "alpha".to_string(),
            "beta".to_string(),
            "gamma".to_string(),
        ]);

        store.records[0].school_name = Some("Alpha Academy".to_string());
        store.records[0].apply_validation(true, true);
        store.records[1].apply_validation(false, false);
        store.records[1].apply_wayback(None, None);

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.named, 1);
        assert_eq!(stats.validated, 2);
        assert_eq!(stats.both, 1);
        assert_eq!(stats.dead, 1);
        assert_eq!(stats.wayback_checked, 1);
    }
}
