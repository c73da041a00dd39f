// src/db/models/package.rs

//! Package model - one row per package in the snapshot

use crate::error::Result;
use rusqlite::{params, Connection};

/// A package record: name and version from its manifest, plus its location
/// relative to the dependency-tree root (layout-preserving, e.g.
/// `"@scope/pkg"` or `".pnpm/foo@1.0.0/node_modules/foo"`).
#[derive(Debug, Clone)]
pub struct Package {
    pub id: Option<i64>,
    pub name: String,
    pub version: String,
    pub path: String,
}

impl Package {
    pub fn new(name: String, version: String, path: String) -> Self {
        Self {
            id: None,
            name,
            version,
            path,
        }
    }

    /// Insert this package, or return the existing id when the
    /// (name, version, path) triple is already present.
    ///
    /// A single upsert statement keeps this atomic; pathological trees can
    /// touch the same package record more than once.
    pub fn upsert(&mut self, conn: &Connection) -> Result<i64> {
        let mut stmt = conn.prepare_cached(
            "INSERT INTO packages (name, version, path) VALUES (?1, ?2, ?3)
             ON CONFLICT(name, version, path) DO UPDATE SET name = name
             RETURNING id",
        )?;
        let id: i64 = stmt.query_row(params![self.name, self.version, self.path], |row| {
            row.get(0)
        })?;
        self.id = Some(id);
        Ok(id)
    }

    /// Count all packages in the snapshot.
    pub fn count(conn: &Connection) -> Result<usize> {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM packages", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
