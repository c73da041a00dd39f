// src/db/mod.rs

//! Snapshot store - transactional content-addressed storage over SQLite
//!
//! The `Store` owns the database connection for its whole lifetime and is
//! the single writer; readers (unpack, status) open their own store after
//! pack has run to completion, so no cross-process coordination is needed.
//!
//! On open the store enables WAL journaling with `synchronous=NORMAL` for
//! write throughput, creates the schema if absent, and records the schema
//! version in the metadata table.

pub mod models;
pub mod schema;

use crate::error::{Error, Result};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::{Path, PathBuf};
use tracing::debug;

use models::{Blob, BlobStats, FileRow, FileRowWithPackage, Package};

pub struct Store {
    /// `None` after `close()`; every operation then fails with `Closed`
    conn: Option<Connection>,
    path: PathBuf,
}

impl Store {
    /// Open (creating if necessary) a snapshot database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        schema::create_schema(&conn)?;

        let store = Store {
            conn: Some(conn),
            path,
        };
        store.set_metadata("schema_version", schema::SCHEMA_VERSION)?;

        debug!("Opened snapshot store at {}", store.path.display());
        Ok(store)
    }

    /// Path this store was opened at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn conn(&self) -> Result<&Connection> {
        self.conn.as_ref().ok_or(Error::Closed)
    }

    /// Upsert a metadata key.
    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    /// Fetch a metadata value; `None` when the key is absent.
    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn()?
            .query_row(
                "SELECT value FROM metadata WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert a package, or return the existing id for a known triple.
    pub fn insert_package(&self, name: &str, version: &str, path: &str) -> Result<i64> {
        Package::new(name.to_string(), version.to_string(), path.to_string()).upsert(self.conn()?)
    }

    pub fn package_count(&self) -> Result<usize> {
        Package::count(self.conn()?)
    }

    pub fn has_blob(&self, hash: &str) -> Result<bool> {
        Blob::exists(self.conn()?, hash)
    }

    /// Insert a blob; a duplicate digest is silently ignored.
    pub fn insert_blob(&self, blob: &Blob) -> Result<()> {
        blob.insert(self.conn()?)
    }

    /// Fetch a blob's compressed content; `None` when the digest is unknown.
    pub fn get_blob(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        Blob::fetch_content(self.conn()?, hash)
    }

    pub fn blob_stats(&self) -> Result<BlobStats> {
        Blob::stats(self.conn()?)
    }

    /// Upsert a file row by (package, relative path).
    pub fn insert_file(&self, file: &FileRow) -> Result<()> {
        file.upsert(self.conn()?)
    }

    /// Every file row, with its package path joined in.
    pub fn all_files(&self) -> Result<Vec<FileRowWithPackage>> {
        FileRow::list_all_with_package(self.conn()?)
    }

    pub fn file_count(&self) -> Result<usize> {
        FileRow::count(self.conn()?)
    }

    /// Run `f` inside a single write transaction.
    ///
    /// The closure's return value is forwarded; any error aborts and rolls
    /// back. Model methods accept the transaction wherever they accept a
    /// connection.
    pub fn transaction<F, T>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T>,
    {
        let conn = self.conn.as_mut().ok_or(Error::Closed)?;
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    /// Release the database handle, checkpointing the WAL.
    ///
    /// Subsequent operations fail with `Closed`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| Error::Database(e))?;
            debug!("Closed snapshot store at {}", self.path.display());
        }
        Ok(())
    }
}
