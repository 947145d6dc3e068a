// src/lib.rs

//! Cyweb
//!
//! Catalog viewer for APT-style (Cydia/Sileo) package repositories.
//!
//! # Architecture
//!
//! - Repositories: user-registered base URLs, persisted in SQLite
//! - Fetching: each repository is probed for a `Packages` index at a fixed
//!   list of candidate paths; plain and gzip indexes are supported
//! - Parsing: lenient stanza parser, malformed input yields fewer records
//!   rather than errors
//! - Index: parsed packages are kept in memory per repository and replaced
//!   wholesale on every successful fetch
//! - Installs are simulated only

pub mod catalog;
pub mod db;
mod error;
pub mod index;
pub mod registry;
pub mod repository;

pub use catalog::{Catalog, SimulatedInstall};
pub use error::{Error, Result};
pub use index::PackageIndexStore;
pub use registry::{RepositoryEntry, RepositoryRegistry};
pub use repository::{FetchFailure, IndexFetcher, PackageRecord};
