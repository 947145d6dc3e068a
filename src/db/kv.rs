// src/db/kv.rs

//! String key-value persistence

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, params};
use std::collections::HashMap;
use std::sync::Mutex;

/// Persistent `get`/`set` store for small string documents
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// [`KeyValueStore`] backed by the `kv_store` table
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Wrap a connection whose schema is already migrated
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Open the database at `db_path` (see [`super::open`])
    pub fn open(db_path: &str) -> Result<Self> {
        Ok(Self::new(super::open(db_path)?))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }
}

/// Non-persistent [`KeyValueStore`], for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn sqlite_store() -> (NamedTempFile, SqliteStore) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        crate::db::init(&db_path).unwrap();
        let store = SqliteStore::open(&db_path).unwrap();
        (temp_file, store)
    }

    #[test]
    fn test_sqlite_get_missing() {
        let (_temp, store) = sqlite_store();
        assert_eq!(store.get("cyweb.repos").unwrap(), None);
    }

    #[test]
    fn test_sqlite_set_overwrites() {
        let (_temp, store) = sqlite_store();

        store.set("cyweb.repos", "[]").unwrap();
        store.set("cyweb.repos", "[{\"url\":\"https://a.example/\"}]").unwrap();

        assert_eq!(
            store.get("cyweb.repos").unwrap().as_deref(),
            Some("[{\"url\":\"https://a.example/\"}]")
        );
    }

    #[test]
    fn test_sqlite_persists_across_connections() {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        crate::db::init(&db_path).unwrap();

        SqliteStore::open(&db_path).unwrap().set("k", "v").unwrap();
        let reopened = SqliteStore::open(&db_path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }
}
