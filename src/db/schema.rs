// src/db/schema.rs

//! Snapshot database schema
//!
//! Four tables make a snapshot self-describing:
//! - metadata: key/value pairs about the snapshot itself
//! - packages: one row per package, with its tree-relative path
//! - blobs: deduplicated file contents keyed by SHA-256 digest
//! - files: one row per file, joining a package to a blob

use crate::error::Result;
use rusqlite::Connection;
use tracing::debug;

/// Schema version written into the metadata table on open
pub const SCHEMA_VERSION: &str = "1";

const CREATE_TABLES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS metadata (
        key TEXT PRIMARY KEY,
        value TEXT
    );

    CREATE TABLE IF NOT EXISTS packages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        version TEXT NOT NULL,
        path TEXT NOT NULL,
        UNIQUE(name, version, path)
    );

    CREATE TABLE IF NOT EXISTS blobs (
        hash TEXT PRIMARY KEY,
        content BLOB NOT NULL,
        original_size INTEGER,
        compressed_size INTEGER
    );

    CREATE TABLE IF NOT EXISTS files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        package_id INTEGER REFERENCES packages(id),
        relative_path TEXT NOT NULL,
        blob_hash TEXT REFERENCES blobs(hash),
        mode INTEGER,
        mtime INTEGER,
        UNIQUE(package_id, relative_path)
    );

    CREATE INDEX IF NOT EXISTS idx_files_package ON files(package_id);
    CREATE INDEX IF NOT EXISTS idx_files_blob ON files(blob_hash);
";

/// Create all tables and indexes if they do not exist yet.
///
/// Safe to call on every open; an existing snapshot is left untouched.
pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_TABLES_SQL)?;
    debug!("Snapshot schema ready (version {})", SCHEMA_VERSION);
    Ok(())
}
