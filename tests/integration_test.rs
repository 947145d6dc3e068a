// tests/integration_test.rs

//! Integration tests for Cyweb
//!
//! These tests verify end-to-end functionality across modules, using a
//! scripted transport instead of the network.

use cyweb::db::{self, MemoryStore, SqliteStore};
use cyweb::repository::{
    IndexFetcher, Response, Transport, TransportError, candidate_urls, parsers,
};
use cyweb::{Catalog, Error, PackageIndexStore, RepositoryRegistry};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Canned responses keyed by URL; anything else is a connection error
#[derive(Default)]
struct ScriptedTransport {
    responses: HashMap<String, Response>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn respond(mut self, url: &str, response: Response) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str) -> Result<Response, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .get(url)
            .cloned()
            .ok_or_else(|| TransportError(format!("blocked: {}", url)))
    }
}

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

#[test]
fn test_gzip_fallback_end_to_end() {
    let base = "https://example.test/";
    let transport = Arc::new(
        ScriptedTransport::default()
            .respond("https://example.test/Packages", Response::with_status(404))
            .respond(
                "https://example.test/Packages.gz",
                Response::ok(gzip(
                    "Package: foo\nVersion: 1.0\n\nPackage: bar\nVersion: 2.0\n",
                )),
            ),
    );
    let store = Arc::new(PackageIndexStore::new());
    let fetcher = IndexFetcher::new(transport.clone(), store.clone());

    assert_eq!(fetcher.sync(base).unwrap(), 2);

    let records = store.get(base);
    assert_eq!(records.len(), 2);

    let first: Vec<_> = records[0].fields().collect();
    assert_eq!(first, vec![("Package", "foo"), ("Version", "1.0")]);
    assert_eq!(records[0].repo(), base);

    let second: Vec<_> = records[1].fields().collect();
    assert_eq!(second, vec![("Package", "bar"), ("Version", "2.0")]);
    assert_eq!(records[1].repo(), base);

    // Neither the bz2 nor the dists path was tried
    assert_eq!(
        transport.requests(),
        vec![
            "https://example.test/Packages",
            "https://example.test/Packages.gz"
        ]
    );
}

#[test]
fn test_exhaustion_reports_four_urls_in_order() {
    let transport = Arc::new(ScriptedTransport::default());
    let fetcher = IndexFetcher::new(transport.clone(), Arc::new(PackageIndexStore::new()));

    let failure = match fetcher.sync("https://example.test") {
        Err(Error::Fetch(failure)) => failure,
        other => panic!("expected a fetch failure, got {:?}", other),
    };

    assert_eq!(failure.attempted_urls().len(), 4);
    assert_eq!(failure.attempted_urls(), candidate_urls("https://example.test"));
    assert_eq!(transport.requests(), candidate_urls("https://example.test"));
    assert!(fetcher.store().is_empty());
}

#[test]
fn test_record_count_matches_stanzas_with_package() {
    let raw = "Package: one\n\n\n\
               Name: no package here\n\n\
               Package: two\nDescription: first line\n continued\n\n\
               Package:\n\n\
               Package: three\n";

    let records = parsers::parse(raw, "https://example.test/");
    let names: Vec<_> = records.iter().map(|r| r.package()).collect();
    assert_eq!(names, vec!["one", "two", "three"]);
    assert_eq!(records[1].description(), Some("first line"));
}

#[test]
fn test_catalog_with_sqlite_registry() {
    let temp_file = NamedTempFile::new().unwrap();
    let db_path = temp_file.path().to_str().unwrap().to_string();
    db::init(&db_path).unwrap();

    let transport = Arc::new(
        ScriptedTransport::default()
            .respond(
                "https://one.example/Packages",
                Response::ok("Package: OpenSSH\nMaintainer: Someone\n"),
            )
            .respond(
                "https://two.example/dists/stable/main/binary-amd64/Packages",
                Response::ok("Package: com.example.ssh-helper\nName: SSH Helper\n"),
            ),
    );

    {
        let catalog = Catalog::new(
            RepositoryRegistry::new(SqliteStore::open(&db_path).unwrap()),
            transport.clone(),
        );
        catalog
            .add_repository("https://one.example/", Some("One"), None, Some("iOS 14+"))
            .unwrap();
        catalog
            .add_repository("https://two.example/", None, None, None)
            .unwrap();
    }

    // Registered repositories survive a new session; fetched indexes don't
    let catalog = Catalog::new(
        RepositoryRegistry::new(SqliteStore::open(&db_path).unwrap()),
        transport,
    );
    let repos = catalog.registry().list().unwrap();
    assert_eq!(repos.len(), 2);
    assert_eq!(repos[0].display_name(), "One");
    assert_eq!(repos[0].compat_label(), "iOS 14+");
    assert!(catalog.search("ssh").is_empty());

    let results = catalog.refresh_all().unwrap();
    assert!(results.iter().all(|(_, r)| r.is_ok()));

    let hits = catalog.search("openssh");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].repo(), "https://one.example/");

    let hits: Vec<_> = catalog
        .search("SSH")
        .iter()
        .map(|r| r.package().to_string())
        .collect();
    assert_eq!(hits, vec!["OpenSSH", "com.example.ssh-helper"]);

    catalog.remove_repository("https://one.example/").unwrap();
    assert_eq!(catalog.search("ssh").len(), 1);
}

#[test]
fn test_refetch_replaces_records() {
    struct Versioned(Mutex<u32>);

    impl Transport for Versioned {
        fn get(&self, _url: &str) -> Result<Response, TransportError> {
            let mut n = self.0.lock().unwrap();
            *n += 1;
            let body = if *n == 1 {
                "Package: a\n\nPackage: b\n"
            } else {
                "Package: c\n"
            };
            Ok(Response::ok(body))
        }
    }

    let catalog = Catalog::new(
        RepositoryRegistry::new(MemoryStore::new()),
        Arc::new(Versioned(Mutex::new(0))),
    );

    catalog.fetch("https://example.test/").unwrap();
    assert_eq!(catalog.packages("https://example.test/").len(), 2);

    catalog.fetch("https://example.test/").unwrap();
    let records = catalog.packages("https://example.test/");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].package(), "c");
}

#[test]
fn test_database_init_creates_parent_directories() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir
        .path()
        .join("nested/path/to/cyweb.db")
        .to_str()
        .unwrap()
        .to_string();

    let result = db::init(&db_path);
    assert!(result.is_ok(), "Should create parent directories");
    assert!(
        std::path::Path::new(&db_path).exists(),
        "Database should exist in nested path"
    );
}

#[test]
fn test_open_requires_init() {
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("missing.db");

    let result = SqliteStore::open(db_path.to_str().unwrap());
    assert!(matches!(result, Err(Error::DatabaseNotFound(_))));
}
