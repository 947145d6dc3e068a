// src/catalog.rs

//! The catalog context: registered repositories plus their fetched indexes
//!
//! A [`Catalog`] owns everything a front end needs. Registered repositories
//! are persistent; fetched package indexes live only as long as the catalog.

use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use crate::index::PackageIndexStore;
use crate::registry::RepositoryRegistry;
use crate::repository::{IndexFetcher, PackageRecord, Transport};
use std::sync::Arc;
use tracing::info;

/// Number of packages highlighted after a fetch
pub const FEATURED_COUNT: usize = 6;

/// What an install would have done; nothing is downloaded or installed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedInstall {
    pub package: String,
    pub version: Option<String>,
    /// `.deb` location, when the record carries a `Filename`
    pub deb_url: Option<String>,
}

pub struct Catalog<S: KeyValueStore> {
    registry: RepositoryRegistry<S>,
    fetcher: IndexFetcher,
}

impl<S: KeyValueStore> Catalog<S> {
    /// Create a catalog with an empty package index
    pub fn new(registry: RepositoryRegistry<S>, transport: Arc<dyn Transport>) -> Self {
        let fetcher = IndexFetcher::new(transport, Arc::new(PackageIndexStore::new()));
        Self::with_fetcher(registry, fetcher)
    }

    pub fn with_fetcher(registry: RepositoryRegistry<S>, fetcher: IndexFetcher) -> Self {
        Self { registry, fetcher }
    }

    pub fn registry(&self) -> &RepositoryRegistry<S> {
        &self.registry
    }

    pub fn store(&self) -> &PackageIndexStore {
        self.fetcher.store()
    }

    /// Register a repository; see [`RepositoryRegistry::add`]
    pub fn add_repository(
        &self,
        url: &str,
        name: Option<&str>,
        icon: Option<&str>,
        compat: Option<&str>,
    ) -> Result<bool> {
        self.registry.add(url, name, icon, compat)
    }

    /// Unregister a repository and forget its fetched packages
    pub fn remove_repository(&self, url: &str) -> Result<bool> {
        let removed = self.registry.remove(url)?;
        self.store().remove(url);
        Ok(removed)
    }

    /// Fetch one repository's index into the catalog
    ///
    /// The repository doesn't need to be registered.
    pub fn fetch(&self, url: &str) -> Result<usize> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("Enter repo URL".to_string()));
        }
        self.fetcher.sync(url)
    }

    /// Fetch every registered repository
    pub fn refresh_all(&self) -> Result<Vec<(String, Result<usize>)>> {
        let urls = self.registry.urls()?;
        let results = self.fetcher.refresh_all(&urls);

        let ok = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!("Refreshed {}/{} repositories", ok, results.len());
        Ok(results)
    }

    /// Packages indexed for `url`, empty if it hasn't been fetched
    pub fn packages(&self, url: &str) -> Arc<Vec<PackageRecord>> {
        self.store().get(url)
    }

    /// The first few packages of `url`
    pub fn featured(&self, url: &str) -> Vec<PackageRecord> {
        self.packages(url)
            .iter()
            .take(FEATURED_COUNT)
            .cloned()
            .collect()
    }

    /// Search all fetched repositories by package id, name or maintainer
    pub fn search(&self, query: &str) -> Vec<PackageRecord> {
        self.store().search_all(query)
    }

    /// Look up a package in a fetched repository
    pub fn package(&self, url: &str, package: &str) -> Result<PackageRecord> {
        self.store().find(url, package).ok_or_else(|| {
            Error::NotFound(format!("Package '{}' is not indexed for {}", package, url))
        })
    }

    /// Pretend to install a package
    pub fn install(&self, url: &str, package: &str) -> Result<SimulatedInstall> {
        let record = self.package(url, package)?;
        info!("Simulated install of {}", record.package());

        Ok(SimulatedInstall {
            package: record.package().to_string(),
            version: record.version().map(str::to_string),
            deb_url: record.deb_url(),
        })
    }
}
