// src/packer.rs

//! Pack a dependency tree into a fresh snapshot
//!
//! Pack always rewrites: an existing snapshot at the output path is deleted
//! together with its WAL sidecars before the store is opened, so a snapshot
//! on disk is either complete or from a previous run.
//!
//! All inserts happen inside one write transaction. For every file the
//! content is read and hashed; the blob is compressed and inserted only
//! when its digest is not already stored, which is where deduplication
//! happens. The `has_blob` pre-check is a performance hint - the insert
//! itself ignores duplicate digests, so a future hash/compress worker pool
//! feeding this writer stays correct.

use crate::compression;
use crate::db::models::{Blob, FileRow, Package};
use crate::db::Store;
use crate::error::{Error, Result};
use crate::hash;
use crate::progress::{self, ProgressObserver};
use crate::scanner;
use chrono::{SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct PackOptions {
    pub source: PathBuf,
    pub output: PathBuf,
    /// gzip level, 1 (fastest) to 9 (smallest)
    pub compression_level: u32,
    /// Record a hash of the sibling package-lock.json when present
    pub include_lockfile: bool,
}

/// What a pack run produced.
#[derive(Debug, Clone)]
pub struct PackSummary {
    pub output: PathBuf,
    pub package_count: usize,
    pub file_count: usize,
    /// Total uncompressed size of all scanned files
    pub total_size: u64,
    /// Size of the snapshot file on disk after close
    pub db_size: u64,
    /// Files whose content was already stored under the same digest
    pub deduplicated: usize,
}

impl PackSummary {
    /// Size reduction of the snapshot relative to the tree, in percent.
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size > 0 {
            (1.0 - self.db_size as f64 / self.total_size as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// SQLite sidecar path: the suffix is appended to the full file name.
fn sidecar(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Delete a previous snapshot and its journal sidecars.
fn remove_stale_snapshot(output: &Path) -> Result<()> {
    if output.exists() {
        info!("Removing existing snapshot {}", output.display());
        fs::remove_file(output)?;
    }
    for suffix in ["-wal", "-shm"] {
        let journal = sidecar(output, suffix);
        if journal.exists() {
            fs::remove_file(&journal)?;
        }
    }
    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// Pack the tree at `options.source` into a snapshot at `options.output`.
///
/// `scan_progress` fires per package during the scan, `file_progress` per
/// file during the database write.
pub fn pack(
    options: &PackOptions,
    scan_progress: Option<&dyn ProgressObserver>,
    file_progress: Option<&dyn ProgressObserver>,
) -> Result<PackSummary> {
    if !options.source.exists() {
        return Err(Error::SourceNotFound(options.source.clone()));
    }
    let source = options.source.canonicalize()?;
    let output = absolute(&options.output)?;

    info!("Scanning {}", source.display());
    let scan = scanner::scan_tree(&source, scan_progress)?;
    info!(
        "Found {} packages, {} files ({} bytes)",
        scan.packages.len(),
        scan.total_files,
        scan.total_size
    );

    remove_stale_snapshot(&output)?;

    let mut store = Store::open(&output)?;
    store.set_metadata(
        "created_at",
        &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    )?;
    store.set_metadata(
        "node_version",
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")),
    )?;
    store.set_metadata("source_path", &source.to_string_lossy())?;

    if options.include_lockfile {
        record_lockfile_hash(&store, &source)?;
    }

    let total_files = scan.total_files;
    let level = options.compression_level;
    let mut deduplicated = 0usize;

    store.transaction(|tx| {
        let mut files_done = 0usize;

        for pkg in &scan.packages {
            let pkg_id =
                Package::new(pkg.name.clone(), pkg.version.clone(), pkg.path.clone()).upsert(tx)?;

            for file in &pkg.files {
                let content = fs::read(&file.absolute_path)?;
                let digest = hash::sha256(&content);

                if Blob::exists(tx, &digest)? {
                    deduplicated += 1;
                } else {
                    let compressed = compression::compress(&content, level)?;
                    Blob::new(digest.clone(), compressed, content.len() as u64).insert(tx)?;
                }

                FileRow::new(pkg_id, file.relative_path.clone(), digest, file.mode, file.mtime)
                    .upsert(tx)?;

                files_done += 1;
                progress::emit(
                    file_progress,
                    files_done,
                    total_files,
                    Some(progress::display_path(&file.relative_path)),
                );
            }
        }

        Ok(())
    })?;

    // Close before measuring so the WAL is checkpointed into the main file
    store.close()?;
    let db_size = fs::metadata(&output)?.len();
    debug!("Snapshot written: {} bytes", db_size);

    Ok(PackSummary {
        output,
        package_count: scan.packages.len(),
        file_count: total_files,
        total_size: scan.total_size,
        db_size,
        deduplicated,
    })
}

/// Hash the sibling lockfile into snapshot metadata. Absence is not an
/// error; a lockfile is simply not always there.
fn record_lockfile_hash(store: &Store, source: &Path) -> Result<()> {
    let Some(parent) = source.parent() else {
        return Ok(());
    };
    let lockfile = parent.join("package-lock.json");
    if lockfile.exists() {
        let content = fs::read_to_string(&lockfile)?;
        store.set_metadata("lockfile_hash", &hash::sha256_str(&content))?;
        debug!("Recorded lockfile hash from {}", lockfile.display());
    }
    Ok(())
}
