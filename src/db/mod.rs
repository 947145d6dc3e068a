// src/db/mod.rs

//! Database layer for Cyweb
//!
//! This module handles all SQLite operations including:
//! - Database initialization and schema creation
//! - Connection management
//! - The key-value store used to persist repository entries

pub mod kv;
pub mod schema;

pub use kv::{KeyValueStore, MemoryStore, SqliteStore};

use crate::error::{Error, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, info};

/// Initialize a new Cyweb database at the specified path
///
/// Creates the database file and applies the schema. Calling it on an
/// existing database is safe.
pub fn init(db_path: &str) -> Result<()> {
    debug!("Initializing database at: {}", db_path);

    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| Error::InitError(format!("Failed to create database directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )?;

    schema::migrate(&conn)?;

    info!("Database initialized successfully");
    Ok(())
}

/// Open an existing Cyweb database
///
/// Fails with [`Error::DatabaseNotFound`] if `db_path` doesn't exist; run
/// [`init`] first.
pub fn open(db_path: &str) -> Result<Connection> {
    if !Path::new(db_path).exists() {
        return Err(Error::DatabaseNotFound(db_path.to_string()));
    }

    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
    schema::migrate(&conn)?;

    Ok(conn)
}
