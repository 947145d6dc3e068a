// src/repository/mod.rs

//! Repository index acquisition
//!
//! This module provides functionality for:
//! - Probing a repository base URL for its `Packages` index
//! - Decoding plain and gzip-compressed indexes
//! - Parsing the index into [`PackageRecord`]s
//! - Publishing the result to the shared [`PackageIndexStore`]

pub mod decode;
pub mod parsers;
pub mod transport;

pub use parsers::{PackageRecord, ParseStats};
pub use transport::{FetchConfig, HttpTransport, Response, Transport, TransportError};

use crate::error::Result;
use crate::index::PackageIndexStore;
use decode::DecodeMode;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Index locations tried under a repository base, in order
pub const CANDIDATE_PATHS: [&str; 4] = [
    "Packages",
    "Packages.gz",
    "Packages.bz2",
    "dists/stable/main/binary-amd64/Packages",
];

/// Append a trailing `/` to `base` unless it already has one
pub fn normalize_base(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

/// Full URLs of every candidate index file for `base`
pub fn candidate_urls(base: &str) -> Vec<String> {
    let base = normalize_base(base);
    CANDIDATE_PATHS
        .iter()
        .map(|path| format!("{}{}", base, path))
        .collect()
}

/// Why a single candidate URL was given up on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// No response at all
    Transport(String),
    /// Response with a non-2xx status
    Status(u16),
    /// Payload could not be turned into text
    Decode(String),
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::Transport(msg) => write!(f, "{}", msg),
            AttemptError::Status(status) => write!(f, "HTTP {}", status),
            AttemptError::Decode(msg) => write!(f, "{}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub url: String,
    pub error: AttemptError,
}

/// Every candidate index path of a repository failed
#[derive(Debug, Clone)]
pub struct FetchFailure {
    pub repo: String,
    /// One entry per candidate, in probe order
    pub attempts: Vec<Attempt>,
}

impl FetchFailure {
    pub fn attempted_urls(&self) -> Vec<&str> {
        self.attempts.iter().map(|a| a.url.as_str()).collect()
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to fetch Packages for {}. Tried:", self.repo)?;
        for attempt in &self.attempts {
            write!(f, "\n  {} ({})", attempt.url, attempt.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for FetchFailure {}

/// Result of a successful probe
#[derive(Debug, Clone)]
pub struct FetchedIndex {
    pub repo: String,
    /// The candidate URL that produced the records
    pub source_url: String,
    pub records: Vec<PackageRecord>,
    pub stats: ParseStats,
}

/// Fetches repository indexes and publishes them to a [`PackageIndexStore`]
///
/// Concurrent [`IndexFetcher::sync`] calls for the same repository race and
/// the last one to finish wins, unless the fetcher was built with
/// [`IndexFetcher::serialized`].
pub struct IndexFetcher {
    transport: Arc<dyn Transport>,
    store: Arc<PackageIndexStore>,
    in_flight: Option<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl IndexFetcher {
    pub fn new(transport: Arc<dyn Transport>, store: Arc<PackageIndexStore>) -> Self {
        Self {
            transport,
            store,
            in_flight: None,
        }
    }

    /// Make overlapping syncs of the same repository run one at a time
    pub fn serialized(mut self) -> Self {
        self.in_flight = Some(Mutex::new(HashMap::new()));
        self
    }

    pub fn store(&self) -> &Arc<PackageIndexStore> {
        &self.store
    }

    /// Probe the candidate paths of `repo_url` and parse the first usable one
    ///
    /// Transport errors, non-2xx statuses and undecodable payloads move on
    /// to the next candidate. Each candidate is requested at most once.
    pub fn fetch_index(&self, repo_url: &str) -> std::result::Result<FetchedIndex, FetchFailure> {
        info!("Fetching package index for {}", repo_url);

        let base = normalize_base(repo_url);
        let mut attempts = Vec::with_capacity(CANDIDATE_PATHS.len());

        for path in CANDIDATE_PATHS {
            let url = format!("{}{}", base, path);

            let response = match self.transport.get(&url) {
                Ok(response) => response,
                Err(e) => {
                    debug!("{} unreachable: {}", url, e);
                    attempts.push(Attempt {
                        url,
                        error: AttemptError::Transport(e.0),
                    });
                    continue;
                }
            };

            if !response.is_success() {
                debug!("{} returned HTTP {}", url, response.status);
                attempts.push(Attempt {
                    url,
                    error: AttemptError::Status(response.status),
                });
                continue;
            }

            let mode = DecodeMode::select(path, &response);
            let text = match decode::decode(mode, &response.body) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Could not decode {}: {}", url, e);
                    attempts.push(Attempt {
                        url,
                        error: AttemptError::Decode(e.to_string()),
                    });
                    continue;
                }
            };

            let (records, stats) = parsers::parse_with_stats(&text, repo_url);
            info!("Fetched {} packages from {}", records.len(), url);

            return Ok(FetchedIndex {
                repo: repo_url.to_string(),
                source_url: url,
                records,
                stats,
            });
        }

        warn!(
            "No usable package index for {} after {} attempts",
            repo_url,
            attempts.len()
        );
        Err(FetchFailure {
            repo: repo_url.to_string(),
            attempts,
        })
    }

    /// Fetch `repo_url` and replace its entry in the store
    ///
    /// Returns the number of records stored. On failure the store is left
    /// untouched.
    pub fn sync(&self, repo_url: &str) -> Result<usize> {
        let Some(lock) = self.repo_lock(repo_url) else {
            return self.fetch_and_store(repo_url);
        };

        let result = {
            let _held = lock.lock().unwrap_or_else(|e| e.into_inner());
            self.fetch_and_store(repo_url)
        };
        self.release_lock(repo_url, lock);
        result
    }

    fn fetch_and_store(&self, repo_url: &str) -> Result<usize> {
        let fetched = self.fetch_index(repo_url)?;
        let count = fetched.records.len();
        self.store
            .put_from(repo_url, fetched.records, Some(fetched.source_url));
        Ok(count)
    }

    /// Sync every repository in `repo_urls` concurrently
    ///
    /// Each repository is fetched independently; results come back in the
    /// order of `repo_urls`.
    pub fn refresh_all(&self, repo_urls: &[String]) -> Vec<(String, Result<usize>)> {
        info!("Refreshing {} repositories", repo_urls.len());

        repo_urls
            .par_iter()
            .map(|url| (url.clone(), self.sync(url)))
            .collect()
    }

    fn repo_lock(&self, repo_url: &str) -> Option<Arc<Mutex<()>>> {
        let in_flight = self.in_flight.as_ref()?;
        let mut locks = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        Some(Arc::clone(locks.entry(repo_url.to_string()).or_default()))
    }

    /// Drop the map entry once no other sync holds or waits on `lock`
    fn release_lock(&self, repo_url: &str, lock: Arc<Mutex<()>>) {
        let Some(in_flight) = self.in_flight.as_ref() else {
            return;
        };
        let mut locks = in_flight.lock().unwrap_or_else(|e| e.into_inner());
        // One reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            locks.remove(repo_url);
        }
    }
}
