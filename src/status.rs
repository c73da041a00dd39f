// src/status.rs

//! Compare a snapshot against the live tree
//!
//! Every file row in the snapshot is checked against the filesystem: a
//! missing file is reported as only-in-db, a file whose re-hashed content
//! differs from the stored digest as modified, everything else counts as
//! unchanged. Re-hashing is CPU-bound and runs on the rayon pool; the
//! database is only read once up front.

use crate::db::Store;
use crate::error::{Error, Result};
use crate::hash;
use crate::progress::{self, ProgressObserver};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::warn;

/// Classification of snapshot files against the live tree.
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// In the snapshot but missing on disk (tree-relative paths)
    pub only_in_db: Vec<String>,
    /// Reserved; extra files on disk are not currently detected
    pub only_in_fs: Vec<String>,
    /// On disk with different content than the snapshot
    pub modified: Vec<String>,
    pub unchanged: usize,
}

impl StatusReport {
    /// True when the tree matches the snapshot exactly.
    pub fn is_clean(&self) -> bool {
        self.modified.is_empty() && self.only_in_db.is_empty()
    }
}

/// Diff the snapshot at `db_path` against the tree at `tree_path`.
///
/// A missing tree is not an error: the report comes back empty after a
/// warning, since restoring is the obvious next step.
pub fn status(
    db_path: &Path,
    tree_path: &Path,
    progress: Option<&dyn ProgressObserver>,
) -> Result<StatusReport> {
    if !db_path.exists() {
        return Err(Error::DatabaseNotFound(db_path.to_path_buf()));
    }

    if !tree_path.exists() {
        warn!(
            "Tree not found at {}; nothing to compare",
            tree_path.display()
        );
        return Ok(StatusReport::default());
    }

    let store = Store::open(db_path)?;
    let files = store.all_files()?;
    let total = files.len();

    let report = Mutex::new(StatusReport::default());
    let done = AtomicUsize::new(0);

    files.par_iter().for_each(|file| {
        let joined = format!("{}/{}", file.package_path, file.row.relative_path);
        let full_path = tree_path.join(&joined);

        let count = done.fetch_add(1, Ordering::Relaxed) + 1;
        progress::emit(
            progress,
            count,
            total,
            Some(progress::display_path(&file.row.relative_path)),
        );

        if !full_path.exists() {
            report.lock().unwrap().only_in_db.push(joined);
            return;
        }

        match fs::read(&full_path) {
            Ok(content) => {
                if hash::sha256(&content) == file.row.blob_hash {
                    report.lock().unwrap().unchanged += 1;
                } else {
                    report.lock().unwrap().modified.push(joined);
                }
            }
            // Unreadable counts as modified: we cannot confirm it matches
            Err(_) => report.lock().unwrap().modified.push(joined),
        }
    });

    let mut report = report.into_inner().unwrap_or_default();
    report.only_in_db.sort();
    report.modified.sort();
    Ok(report)
}
