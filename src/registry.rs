// src/registry.rs

//! User-registered repositories
//!
//! Entries are stored as JSON arrays in a [`KeyValueStore`]:
//! - `cyweb.repos`: every repository the user can fetch
//! - `cyweb.created`: repositories the user described through "create"
//!
//! Creating a repository also registers it, so `cyweb.created` is a subset
//! of `cyweb.repos` unless an entry was later removed.

use crate::db::KeyValueStore;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const REPOS_KEY: &str = "cyweb.repos";
pub const CREATED_KEY: &str = "cyweb.created";

/// A repository the user has registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Free-text compatibility note, e.g. "iOS 12+"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compat: Option<String>,
}

impl RepositoryEntry {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name: None,
            icon: None,
            compat: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_compat(mut self, compat: impl Into<String>) -> Self {
        self.compat = Some(compat.into());
        self
    }

    /// Name to show, falling back to the URL
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }

    /// Compatibility note, "any" when none was given
    pub fn compat_label(&self) -> &str {
        self.compat.as_deref().unwrap_or("any")
    }
}

/// Well-known public repositories offered by `add_samples`
pub fn sample_repositories() -> Vec<RepositoryEntry> {
    vec![
        RepositoryEntry::new("https://havoc.app/")
            .with_name("Havoc")
            .with_compat("iOS 12+"),
        RepositoryEntry::new("https://repo.chariz.com/")
            .with_name("Chariz")
            .with_compat("iOS 10+"),
        RepositoryEntry::new("https://apt.procurs.us/")
            .with_name("Procursus")
            .with_compat("iOS 11+"),
    ]
}

/// Trim an optional text input, treating blank as absent
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Repository list persisted in a [`KeyValueStore`]
pub struct RepositoryRegistry<S: KeyValueStore> {
    kv: S,
}

impl<S: KeyValueStore> RepositoryRegistry<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    fn load(&self, key: &str) -> Result<Vec<RepositoryEntry>> {
        match self.kv.get(key)? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    fn save(&self, key: &str, entries: &[RepositoryEntry]) -> Result<()> {
        self.kv.set(key, &serde_json::to_string(entries)?)
    }

    /// All registered repositories, in registration order
    pub fn list(&self) -> Result<Vec<RepositoryEntry>> {
        self.load(REPOS_KEY)
    }

    /// URLs of all registered repositories
    pub fn urls(&self) -> Result<Vec<String>> {
        Ok(self.list()?.into_iter().map(|r| r.url).collect())
    }

    pub fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.list()?.iter().any(|r| r.url == url))
    }

    /// Register a repository by URL
    ///
    /// The name defaults to the URL; blank icon and compatibility notes are
    /// left unset. Returns `false` if the URL is already registered.
    pub fn add(
        &self,
        url: &str,
        name: Option<&str>,
        icon: Option<&str>,
        compat: Option<&str>,
    ) -> Result<bool> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::Validation("Enter repo URL".to_string()));
        }

        let mut repos = self.list()?;
        if repos.iter().any(|r| r.url == url) {
            return Ok(false);
        }

        repos.push(RepositoryEntry {
            url: url.to_string(),
            name: Some(non_blank(name).unwrap_or_else(|| url.to_string())),
            icon: non_blank(icon),
            compat: non_blank(compat),
        });
        self.save(REPOS_KEY, &repos)?;

        info!("Added repository: {}", url);
        Ok(true)
    }

    /// Register the sample repositories that aren't registered yet
    ///
    /// Returns how many were added.
    pub fn add_samples(&self) -> Result<usize> {
        let mut repos = self.list()?;
        let mut added = 0;

        for sample in sample_repositories() {
            if !repos.iter().any(|r| r.url == sample.url) {
                repos.push(sample);
                added += 1;
            }
        }

        if added > 0 {
            self.save(REPOS_KEY, &repos)?;
        }
        Ok(added)
    }

    /// Unregister every entry with this URL
    ///
    /// Created-repository records are kept. Returns `false` if nothing
    /// matched.
    pub fn remove(&self, url: &str) -> Result<bool> {
        let mut repos = self.list()?;
        let before = repos.len();
        repos.retain(|r| r.url != url);

        if repos.len() == before {
            return Ok(false);
        }

        self.save(REPOS_KEY, &repos)?;
        info!("Removed repository: {}", url);
        Ok(true)
    }

    /// Record a user-described repository and register it
    ///
    /// Name and URL are required. Every call appends a created record; the
    /// repository itself is only registered once.
    pub fn create(
        &self,
        name: &str,
        url: &str,
        icon: Option<&str>,
        compat: Option<&str>,
    ) -> Result<RepositoryEntry> {
        let name = name.trim();
        let url = url.trim();
        if name.is_empty() || url.is_empty() {
            return Err(Error::Validation("Name and URL required".to_string()));
        }

        let entry = RepositoryEntry {
            url: url.to_string(),
            name: Some(name.to_string()),
            icon: non_blank(icon),
            compat: non_blank(compat),
        };

        let mut created = self.load(CREATED_KEY)?;
        created.push(entry.clone());
        self.save(CREATED_KEY, &created)?;

        let mut repos = self.list()?;
        if !repos.iter().any(|r| r.url == entry.url) {
            repos.push(entry.clone());
            self.save(REPOS_KEY, &repos)?;
        }

        info!("Created repository: {} ({})", name, url);
        Ok(entry)
    }

    /// Repositories recorded through [`RepositoryRegistry::create`]
    pub fn created(&self) -> Result<Vec<RepositoryEntry>> {
        self.load(CREATED_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn registry() -> RepositoryRegistry<MemoryStore> {
        RepositoryRegistry::new(MemoryStore::new())
    }

    #[test]
    fn test_add_defaults_name_to_url() {
        let registry = registry();
        assert!(registry.add("  https://repo.example/ ", None, None, None).unwrap());

        let repos = registry.list().unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].url, "https://repo.example/");
        assert_eq!(repos[0].display_name(), "https://repo.example/");
        assert_eq!(repos[0].compat_label(), "any");
    }

    #[test]
    fn test_add_with_icon_and_compat() {
        let registry = registry();
        assert!(
            registry
                .add(
                    "https://repo.example/",
                    Some("Example"),
                    Some(" https://repo.example/CydiaIcon.png "),
                    Some("iOS 15+"),
                )
                .unwrap()
        );
        registry
            .add("https://other.example/", None, Some("  "), Some(""))
            .unwrap();

        let repos = registry.list().unwrap();
        assert_eq!(
            repos[0].icon.as_deref(),
            Some("https://repo.example/CydiaIcon.png")
        );
        assert_eq!(repos[0].compat_label(), "iOS 15+");
        assert_eq!(repos[1].icon, None);
        assert_eq!(repos[1].compat, None);
        // Not part of the created history
        assert!(registry.created().unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_empty_url() {
        let registry = registry();
        let result = registry.add("   ", Some("Nothing"), None, None);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_add_duplicate_is_ignored() {
        let registry = registry();
        assert!(registry.add("https://repo.example/", Some("First"), None, None).unwrap());
        assert!(!registry.add("https://repo.example/", Some("Second"), None, None).unwrap());

        let repos = registry.list().unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].display_name(), "First");
    }

    #[test]
    fn test_add_samples_once() {
        let registry = registry();
        registry.add("https://havoc.app/", Some("Mine"), None, None).unwrap();

        assert_eq!(registry.add_samples().unwrap(), 2);
        assert_eq!(registry.add_samples().unwrap(), 0);

        let urls = registry.urls().unwrap();
        assert_eq!(
            urls,
            vec![
                "https://havoc.app/",
                "https://repo.chariz.com/",
                "https://apt.procurs.us/"
            ]
        );
    }

    #[test]
    fn test_remove() {
        let registry = registry();
        registry.add("https://repo.example/", None, None, None).unwrap();

        assert!(registry.remove("https://repo.example/").unwrap());
        assert!(!registry.remove("https://repo.example/").unwrap());
        assert!(!registry.contains("https://repo.example/").unwrap());
    }

    #[test]
    fn test_create_registers_once() {
        let registry = registry();
        let entry = registry
            .create("Mine", "https://mine.example/", Some(""), Some("iOS 14+"))
            .unwrap();
        assert_eq!(entry.icon, None);
        assert_eq!(entry.compat.as_deref(), Some("iOS 14+"));

        registry
            .create("Mine again", "https://mine.example/", None, None)
            .unwrap();

        assert_eq!(registry.created().unwrap().len(), 2);
        assert_eq!(registry.list().unwrap().len(), 1);
        assert_eq!(registry.list().unwrap()[0].display_name(), "Mine");
    }

    #[test]
    fn test_create_requires_name_and_url() {
        let registry = registry();
        assert!(matches!(
            registry.create("", "https://x.example/", None, None),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            registry.create("Name", " ", None, None),
            Err(Error::Validation(_))
        ));
        assert!(registry.created().unwrap().is_empty());
    }

    #[test]
    fn test_entries_serialize_without_empty_fields() {
        let json = serde_json::to_string(&RepositoryEntry::new("https://a.example/")).unwrap();
        assert_eq!(json, r#"{"url":"https://a.example/"}"#);

        let parsed: RepositoryEntry =
            serde_json::from_str(r#"{"url":"https://b.example/","name":"B"}"#).unwrap();
        assert_eq!(parsed.display_name(), "B");
    }

    #[test]
    fn test_corrupt_json_is_an_error() {
        let kv = MemoryStore::new();
        kv.set(REPOS_KEY, "not json").unwrap();
        let registry = RepositoryRegistry::new(kv);

        assert!(matches!(registry.list(), Err(Error::Json(_))));
    }
}
