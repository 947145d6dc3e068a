// src/repository/parsers/mod.rs

//! Repository index parsers
//!
//! APT-style repositories publish a `Packages` file made of RFC 822-like
//! stanzas. The parser in [`stanza`] turns that text into [`PackageRecord`]s.

pub mod stanza;

pub use stanza::{ParseStats, parse, parse_with_stats};

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One parsed stanza from a repository index, tagged with its repository
///
/// Fields keep the order in which they first appeared in the stanza. Names
/// are case-sensitive and stored exactly as found in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRecord {
    fields: Vec<(String, String)>,
    repo: String,
}

impl PackageRecord {
    /// Create an empty record belonging to `repo`
    pub fn new(repo: impl Into<String>) -> Self {
        Self {
            fields: Vec::new(),
            repo: repo.into(),
        }
    }

    /// Set a field, replacing the value of an existing field with that name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Builder-style variant of [`PackageRecord::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Look up a field by exact name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// All fields in source order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Base URL of the repository this record was fetched from
    pub fn repo(&self) -> &str {
        &self.repo
    }

    /// The `Package` field (empty only for records built by hand)
    pub fn package(&self) -> &str {
        self.get("Package").unwrap_or_default()
    }

    pub fn version(&self) -> Option<&str> {
        self.get("Version")
    }

    /// Display name, falling back to the package identifier
    pub fn name(&self) -> &str {
        self.get("Name").unwrap_or_else(|| self.package())
    }

    /// `Description`, or `Short-Description` when the former is absent
    pub fn description(&self) -> Option<&str> {
        self.get("Description")
            .or_else(|| self.get("Short-Description"))
    }

    pub fn maintainer(&self) -> Option<&str> {
        self.get("Maintainer")
    }

    pub fn icon(&self) -> Option<&str> {
        self.get("Icon")
    }

    pub fn filename(&self) -> Option<&str> {
        self.get("Filename")
    }

    /// Location of the `.deb` archive: repository base joined with `Filename`
    ///
    /// The two are concatenated as-is, so a base without a trailing slash
    /// yields a URL without one too.
    pub fn deb_url(&self) -> Option<String> {
        self.filename().map(|f| format!("{}{}", self.repo, f))
    }
}

impl Serialize for PackageRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 1))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("repo", &self.repo)?;
        map.end()
    }
}
