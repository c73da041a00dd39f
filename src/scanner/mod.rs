// src/scanner/mod.rs

//! Layout-aware traversal of a dependency tree
//!
//! Two on-disk layouts are recognized:
//!
//! - **Flat**: top-level packages sit directly under the tree root, with
//!   scoped packages one level down under `@scope/`.
//! - **Symlink farm** (pnpm): a top-level `.pnpm/` directory holds
//!   per-version subtrees, each exposing its package via an inner
//!   `node_modules/` directory. The outer root is just symlinks into the
//!   farm, so only `.pnpm/` is enumerated.
//!
//! A tree containing `.pnpm/` at its root is always scanned as a symlink
//! farm, even when plain-layout siblings are present.
//!
//! Each package's `path` is recorded relative to the tree root exactly as
//! found, so extraction reproduces the original layout.

use crate::error::Result;
use crate::progress::{self, ProgressObserver};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;
use walkdir::WalkDir;

/// A regular file found inside a package.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Path relative to the package directory
    pub relative_path: String,
    pub absolute_path: PathBuf,
    pub mode: u32,
    pub size: u64,
    /// Modification time in milliseconds since the epoch
    pub mtime: i64,
}

/// A package with its manifest identity and file entries.
#[derive(Debug, Clone)]
pub struct ScannedPackage {
    pub name: String,
    pub version: String,
    /// Location relative to the dependency-tree root
    pub path: String,
    pub files: Vec<ScannedFile>,
}

/// The result of scanning one dependency tree.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub packages: Vec<ScannedPackage>,
    pub total_files: usize,
    pub total_size: u64,
}

#[derive(Debug)]
struct PackageDir {
    path: PathBuf,
    relative_path: String,
}

fn is_symlink_farm(root: &Path) -> bool {
    root.join(".pnpm").is_dir()
}

/// Read name and version from a package manifest.
///
/// Returns `None` when the manifest cannot be read or parsed; private
/// directories without manifests are expected and skipped silently.
fn read_manifest(manifest_path: &Path) -> Option<(String, String)> {
    let content = fs::read_to_string(manifest_path).ok()?;
    let parsed: serde_json::Value = serde_json::from_str(&content).ok()?;

    let name = parsed["name"].as_str().unwrap_or("unknown").to_string();
    let version = parsed["version"].as_str().unwrap_or("0.0.0").to_string();

    Some((name, version))
}

/// Enumerate package directories of a flat layout.
fn collect_flat_package_dirs(root: &Path) -> Result<Vec<PackageDir>> {
    let mut dirs = Vec::new();

    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name == ".bin" || name == ".cache" || name == ".pnpm" {
            continue;
        }

        if name.starts_with('@') {
            // Scope directory: its immediate children are the packages
            for scoped in fs::read_dir(entry.path())? {
                let scoped = scoped?;
                if !scoped.file_type()?.is_dir() {
                    continue;
                }
                let scoped_name = scoped.file_name().to_string_lossy().to_string();
                dirs.push(PackageDir {
                    path: scoped.path(),
                    relative_path: format!("{}/{}", name, scoped_name),
                });
            }
        } else {
            dirs.push(PackageDir {
                path: entry.path(),
                relative_path: name,
            });
        }
    }

    Ok(dirs)
}

/// Enumerate package directories of a symlink-farm layout.
///
/// Each `.pnpm/<entry>/node_modules/<pkg>` is a package; the recorded
/// relative path keeps the full chain so the farm scaffolding is
/// reproduced on extraction.
fn collect_pnpm_package_dirs(root: &Path) -> Result<Vec<PackageDir>> {
    let mut dirs = Vec::new();
    let pnpm_root = root.join(".pnpm");

    for entry in fs::read_dir(&pnpm_root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if name == "node_modules" || name.starts_with('.') {
            continue;
        }

        let inner = entry.path().join("node_modules");
        if !inner.exists() {
            continue;
        }

        for pkg_entry in fs::read_dir(&inner)? {
            let pkg_entry = pkg_entry?;
            if !pkg_entry.file_type()?.is_dir() {
                continue;
            }

            let pkg_name = pkg_entry.file_name().to_string_lossy().to_string();
            if pkg_name == ".bin" {
                continue;
            }

            if pkg_name.starts_with('@') {
                for scoped in fs::read_dir(pkg_entry.path())? {
                    let scoped = scoped?;
                    if !scoped.file_type()?.is_dir() {
                        continue;
                    }
                    let scoped_name = scoped.file_name().to_string_lossy().to_string();
                    dirs.push(PackageDir {
                        path: scoped.path(),
                        relative_path: format!(
                            ".pnpm/{}/node_modules/{}/{}",
                            name, pkg_name, scoped_name
                        ),
                    });
                }
            } else {
                dirs.push(PackageDir {
                    path: pkg_entry.path(),
                    relative_path: format!(".pnpm/{}/node_modules/{}", name, pkg_name),
                });
            }
        }
    }

    Ok(dirs)
}

/// Collect every regular file under one package directory.
///
/// Symbolic links and special files are not emitted. Returns `None` when
/// the directory has no readable manifest.
fn scan_package(pkg_dir: &PackageDir) -> Option<ScannedPackage> {
    let manifest_path = pkg_dir.path.join("package.json");
    let Some((name, version)) = read_manifest(&manifest_path) else {
        debug!(
            "Skipping {} (no readable package.json)",
            pkg_dir.relative_path
        );
        return None;
    };

    let mut files = Vec::new();

    for entry in WalkDir::new(&pkg_dir.path).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(metadata) = entry.metadata() else {
            continue;
        };
        let absolute_path = entry.path().to_path_buf();
        let Ok(stripped) = absolute_path.strip_prefix(&pkg_dir.path) else {
            continue;
        };
        let relative_path = stripped.to_string_lossy().to_string();

        #[cfg(unix)]
        let mode = {
            use std::os::unix::fs::PermissionsExt;
            metadata.permissions().mode()
        };
        #[cfg(not(unix))]
        let mode = 0o644u32;

        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        files.push(ScannedFile {
            relative_path,
            absolute_path,
            mode,
            size: metadata.len(),
            mtime,
        });
    }

    Some(ScannedPackage {
        name,
        version,
        path: pkg_dir.relative_path.clone(),
        files,
    })
}

/// Scan a dependency tree into packages with their file entries.
///
/// The progress observer fires once per package (not per file) with
/// `(packages_done, total_packages, relative_path)`.
pub fn scan_tree(root: &Path, progress: Option<&dyn ProgressObserver>) -> Result<ScanResult> {
    let package_dirs = if is_symlink_farm(root) {
        debug!("Detected symlink-farm layout at {}", root.display());
        collect_pnpm_package_dirs(root)?
    } else {
        debug!("Detected flat layout at {}", root.display());
        collect_flat_package_dirs(root)?
    };

    let total_packages = package_dirs.len();
    let done = AtomicUsize::new(0);

    let packages: Vec<ScannedPackage> = package_dirs
        .par_iter()
        .filter_map(|pkg_dir| {
            let scanned = scan_package(pkg_dir);
            let count = done.fetch_add(1, Ordering::Relaxed) + 1;
            progress::emit(
                progress,
                count,
                total_packages,
                Some(&pkg_dir.relative_path),
            );
            scanned
        })
        .collect();

    let total_files = packages.iter().map(|p| p.files.len()).sum();
    let total_size = packages
        .iter()
        .flat_map(|p| p.files.iter())
        .map(|f| f.size)
        .sum();

    debug!(
        "Scanned {} packages, {} files ({} bytes)",
        packages.len(),
        total_files,
        total_size
    );

    Ok(ScanResult {
        packages,
        total_files,
        total_size,
    })
}
