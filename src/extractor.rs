// src/extractor.rs

//! Materialize a snapshot back onto the filesystem
//!
//! Files are written in snapshot order under `output/<package path>/<file
//! path>`, reproducing the packed layout (symlink-farm scaffolding becomes
//! real directories). Decompressed blobs under 100 KiB are kept in an
//! in-memory cache keyed by digest: the size distribution of a dependency
//! tree is heavy-tailed toward small files, which are also the ones
//! duplicated across packages, so the cache absorbs most repeat
//! decompressions while the size cap keeps memory bounded.

use crate::compression;
use crate::db::Store;
use crate::error::Result;
use crate::progress::{self, ProgressObserver};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Only blobs smaller than this are cached after decompression.
const CACHE_MAX_BLOB_LEN: usize = 100 * 1024;

/// What an extraction produced.
#[derive(Debug, Clone, Copy)]
pub struct ExtractStats {
    pub total_files: usize,
    /// Total decompressed bytes written
    pub total_size: u64,
}

/// Extract every file in the snapshot into `output`.
///
/// A file whose blob is missing is skipped with a warning rather than
/// aborting the whole restore. Permission application is best-effort: only
/// the low 9 mode bits are applied, and failures are ignored for platforms
/// without POSIX semantics.
pub fn extract_files(
    store: &Store,
    output: &Path,
    progress: Option<&dyn ProgressObserver>,
) -> Result<ExtractStats> {
    let files = store.all_files()?;
    let total_files = files.len();
    info!("Extracting {} files to {}", total_files, output.display());

    let mut blob_cache: HashMap<String, Vec<u8>> = HashMap::new();
    let mut total_size: u64 = 0;

    for (index, file) in files.iter().enumerate() {
        progress::emit(
            progress,
            index + 1,
            total_files,
            Some(progress::display_path(&file.row.relative_path)),
        );

        let target = output
            .join(&file.package_path)
            .join(&file.row.relative_path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        // Cache hits write straight from the borrowed entry; small blobs
        // repeat across many files, so this path must not allocate
        if let Some(cached) = blob_cache.get(&file.row.blob_hash) {
            total_size += cached.len() as u64;
            write_entry(&target, cached, file.row.mode)?;
            continue;
        }

        let Some(compressed) = store.get_blob(&file.row.blob_hash)? else {
            warn!(
                "Blob {} missing for {}/{}; skipping file",
                file.row.blob_hash, file.package_path, file.row.relative_path
            );
            continue;
        };
        let content = compression::decompress(&compressed)?;

        total_size += content.len() as u64;
        write_entry(&target, &content, file.row.mode)?;

        if content.len() < CACHE_MAX_BLOB_LEN {
            blob_cache.insert(file.row.blob_hash.clone(), content);
        }
    }

    info!("Extracted {} files ({} bytes)", total_files, total_size);

    Ok(ExtractStats {
        total_files,
        total_size,
    })
}

/// Write one restored file and apply its permissions best-effort: only the
/// low 9 mode bits, and failures are ignored for platforms without POSIX
/// semantics.
fn write_entry(target: &Path, content: &[u8], mode: u32) -> Result<()> {
    fs::write(target, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if mode != 0 {
            let _ = fs::set_permissions(target, fs::Permissions::from_mode(mode & 0o777));
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(())
}
