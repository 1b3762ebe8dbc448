//! Durable key-value blob storage.
//!
//! The service persists the whole collection as a JSON blob under a
//! well-known key, with a second slot for backup snapshots. The
//! [`BlobStore`] trait abstracts the storage engine: production uses
//! `SQLite`, tests use an in-memory map.

use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Well-known storage slot keys.
pub mod keys {
    /// Primary slot: the JSON-serialized array of todo records.
    pub const TODOS: &str = "todos";
    /// Secondary slot: the most recent backup snapshot.
    pub const BACKUP: &str = "todos_backup";
}

/// Trait for durable string-blob storage.
///
/// Writes are synchronous and blocking; there is no transaction
/// discipline beyond a single write per call.
pub trait BlobStore {
    /// Read the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying read fails.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write fails.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying delete fails.
    fn remove(&self, key: &str) -> Result<()>;
}

/// `SQLite`-backed blob store.
///
/// Each operation opens a new connection to the database file. This
/// avoids held-open handles and is acceptable for the low frequency of
/// whole-collection writes.
#[derive(Debug, Clone)]
pub struct SqliteBlobStore {
    db_path: PathBuf,
}

impl SqliteBlobStore {
    /// Create a store backed by the database file at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf() };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the database.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS blobs (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }
}

impl BlobStore for SqliteBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row("SELECT value FROM blobs WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute(
            "INSERT OR REPLACE INTO blobs (key, value, updated_at)
             VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.open()?;
        conn.execute("DELETE FROM blobs WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// In-memory blob store for tests and ephemeral use.
///
/// `set_fail_writes(true)` makes every subsequent write fail, which is
/// how storage-error paths are exercised in tests.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RefCell<HashMap<String, String>>,
    fail_writes: Cell<bool>,
}

impl MemoryBlobStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an in-memory store shared through an `Rc`, so a test can
    /// keep a handle while the service owns the store.
    #[must_use]
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Make every subsequent write fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            return Err(Error::storage(std::io::Error::other("simulated write failure")));
        }
        self.blobs.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

impl BlobStore for Rc<MemoryBlobStore> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        self.as_ref().read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.as_ref().write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.as_ref().remove(key)
    }
}
