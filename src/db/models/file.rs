// src/db/models/file.rs

//! File model - one row per file, joining a package to a blob

use crate::error::Result;
use rusqlite::{params, Connection, Row};

/// A file row: where the file lives inside its package, which blob holds
/// its content, and the POSIX mode and mtime (ms) captured at pack time.
#[derive(Debug, Clone)]
pub struct FileRow {
    pub id: Option<i64>,
    pub package_id: i64,
    /// Path relative to the package directory
    pub relative_path: String,
    pub blob_hash: String,
    pub mode: u32,
    pub mtime: i64,
}

/// A file row joined with its package's tree-relative path, so consumers
/// can compute the full restore path without a second query.
#[derive(Debug, Clone)]
pub struct FileRowWithPackage {
    pub row: FileRow,
    pub package_path: String,
}

impl FileRow {
    pub fn new(package_id: i64, relative_path: String, blob_hash: String, mode: u32, mtime: i64) -> Self {
        Self {
            id: None,
            package_id,
            relative_path,
            blob_hash,
            mode,
            mtime,
        }
    }

    /// Insert this file; on a (package_id, relative_path) conflict the blob
    /// reference, mode, and mtime are overwritten.
    pub fn upsert(&self, conn: &Connection) -> Result<()> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO files (package_id, relative_path, blob_hash, mode, mtime)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(package_id, relative_path) DO UPDATE SET
               blob_hash = excluded.blob_hash,
               mode = excluded.mode,
               mtime = excluded.mtime",
        )?;
        stmt.execute(params![
            self.package_id,
            self.relative_path,
            self.blob_hash,
            self.mode,
            self.mtime
        ])?;
        Ok(())
    }

    /// List every file with its package path joined in.
    pub fn list_all_with_package(conn: &Connection) -> Result<Vec<FileRowWithPackage>> {
        let mut stmt = conn.prepare(
            "SELECT f.id, f.package_id, f.relative_path, f.blob_hash, f.mode, f.mtime, p.path
             FROM files f
             JOIN packages p ON f.package_id = p.id",
        )?;

        let files = stmt
            .query_map([], |row| {
                Ok(FileRowWithPackage {
                    row: Self::from_row(row)?,
                    package_path: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(files)
    }

    /// Count all files in the snapshot.
    pub fn count(conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM files", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            package_id: row.get(1)?,
            relative_path: row.get(2)?,
            blob_hash: row.get(3)?,
            mode: row.get(4)?,
            mtime: row.get(5)?,
        })
    }
}
