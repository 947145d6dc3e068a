// src/index.rs

//! In-memory package index
//!
//! Maps each repository base URL to the records parsed from its last
//! successful fetch. A repository's list is always swapped as a whole, so
//! readers see either the old list or the new one, never a mix.

use crate::repository::PackageRecord;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Records of one repository plus where and when they came from
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub records: Arc<Vec<PackageRecord>>,
    /// Index file URL the records were parsed from
    pub source_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Process-wide mapping from repository base URL to its package list
///
/// Keys keep their first-insertion order; replacing a key's records does
/// not move it.
#[derive(Debug, Default)]
pub struct PackageIndexStore {
    entries: RwLock<Vec<(String, IndexEntry)>>,
}

impl PackageIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Writers only ever swap whole entries, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Vec<(String, IndexEntry)>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<(String, IndexEntry)>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the records stored for `repo_url`
    pub fn put(&self, repo_url: &str, records: Vec<PackageRecord>) {
        self.put_from(repo_url, records, None);
    }

    /// Replace the records stored for `repo_url`, noting the index file used
    pub fn put_from(&self, repo_url: &str, records: Vec<PackageRecord>, source_url: Option<String>) {
        debug!("Storing {} records for {}", records.len(), repo_url);

        let entry = IndexEntry {
            records: Arc::new(records),
            source_url,
            fetched_at: Utc::now(),
        };

        let mut entries = self.write();
        match entries.iter_mut().find(|(url, _)| url == repo_url) {
            Some(slot) => slot.1 = entry,
            None => entries.push((repo_url.to_string(), entry)),
        }
    }

    /// Records for `repo_url`, empty if the repository was never fetched
    pub fn get(&self, repo_url: &str) -> Arc<Vec<PackageRecord>> {
        self.entry(repo_url)
            .map(|e| e.records)
            .unwrap_or_default()
    }

    /// Full entry for `repo_url`, including fetch metadata
    pub fn entry(&self, repo_url: &str) -> Option<IndexEntry> {
        self.read()
            .iter()
            .find(|(url, _)| url == repo_url)
            .map(|(_, entry)| entry.clone())
    }

    /// Drop the records of `repo_url`; does nothing if there are none
    pub fn remove(&self, repo_url: &str) {
        let mut entries = self.write();
        if let Some(pos) = entries.iter().position(|(url, _)| url == repo_url) {
            entries.remove(pos);
            debug!("Removed index for {}", repo_url);
        }
    }

    /// First record in `repo_url` whose `Package` field equals `package`
    pub fn find(&self, repo_url: &str, package: &str) -> Option<PackageRecord> {
        self.get(repo_url)
            .iter()
            .find(|r| r.package() == package)
            .cloned()
    }

    /// Search every repository for records matching `query`
    ///
    /// Matches a case-insensitive substring of `Package`, `Name` or
    /// `Maintainer`. Results follow repository insertion order, then stanza
    /// order. An empty query matches everything.
    pub fn search_all(&self, query: &str) -> Vec<PackageRecord> {
        let query = query.trim().to_lowercase();
        let snapshots: Vec<Arc<Vec<PackageRecord>>> = self
            .read()
            .iter()
            .map(|(_, entry)| Arc::clone(&entry.records))
            .collect();

        snapshots
            .iter()
            .flat_map(|records| records.iter())
            .filter(|record| matches_query(record, &query))
            .cloned()
            .collect()
    }

    /// Repository URLs with stored records, in insertion order
    pub fn repositories(&self) -> Vec<String> {
        self.read().iter().map(|(url, _)| url.clone()).collect()
    }

    /// Number of repositories with stored records
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

fn matches_query(record: &PackageRecord, query: &str) -> bool {
    ["Package", "Name", "Maintainer"].iter().any(|field| {
        record
            .get(field)
            .unwrap_or_default()
            .to_lowercase()
            .contains(query)
    })
}
