// src/db/models/blob.rs

//! Blob model - deduplicated, compressed file contents
//!
//! A blob's key is the SHA-256 digest of the ORIGINAL (uncompressed) bytes;
//! the stored content is the gzip-compressed form. A digest appears at most
//! once, which is what makes the store content-addressed.

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

/// A content-addressed blob row.
#[derive(Debug, Clone)]
pub struct Blob {
    /// SHA-256 hex digest of the uncompressed content
    pub hash: String,
    /// gzip-compressed content
    pub content: Vec<u8>,
    pub original_size: u64,
    pub compressed_size: u64,
}

/// Aggregate statistics over the blobs table.
#[derive(Debug, Clone, Copy)]
pub struct BlobStats {
    pub count: usize,
    pub total_original: u64,
    pub total_compressed: u64,
}

impl Blob {
    pub fn new(hash: String, content: Vec<u8>, original_size: u64) -> Self {
        let compressed_size = content.len() as u64;
        Self {
            hash,
            content,
            original_size,
            compressed_size,
        }
    }

    /// Insert this blob; a second insert with the same digest is a no-op.
    ///
    /// The `exists` pre-check callers do first is a performance hint, not a
    /// correctness guard - the insert itself tolerates duplicates.
    pub fn insert(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT OR IGNORE INTO blobs (hash, content, original_size, compressed_size)
             VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![
            self.hash,
            self.content,
            self.original_size,
            self.compressed_size
        ])?;
        Ok(())
    }

    /// Check whether a blob with the given digest exists.
    pub fn exists(conn: &Connection, hash: &str) -> Result<bool> {
        let mut stmt = conn.prepare_cached("SELECT 1 FROM blobs WHERE hash = ?1")?;
        Ok(stmt.exists(params![hash])?)
    }

    /// Fetch the compressed content for a digest, if present.
    pub fn fetch_content(conn: &Connection, hash: &str) -> Result<Option<Vec<u8>>> {
        let mut stmt = conn.prepare_cached("SELECT content FROM blobs WHERE hash = ?1")?;
        let content = stmt
            .query_row(params![hash], |row| row.get::<_, Vec<u8>>(0))
            .optional()?;
        Ok(content)
    }

    /// Aggregate count and size totals over all blobs.
    pub fn stats(conn: &Connection) -> Result<BlobStats> {
        let mut stmt = conn.prepare(
            "SELECT COUNT(*),
                    COALESCE(SUM(original_size), 0),
                    COALESCE(SUM(compressed_size), 0)
             FROM blobs",
        )?;
        let stats = stmt.query_row([], |row| {
            Ok(BlobStats {
                count: row.get::<_, i64>(0)? as usize,
                total_original: row.get::<_, i64>(1)? as u64,
                total_compressed: row.get::<_, i64>(2)? as u64,
            })
        })?;
        Ok(stats)
    }
}
