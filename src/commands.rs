// src/commands.rs
//! Command handlers for the modvault CLI
//!
//! Thin adapters over the library: wire progress bars to the engine
//! callbacks, check CLI-level preconditions, and print summaries.

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use modvault::{extract_files, pack, status, PackOptions, Store};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

/// A standard bar for file-grained operations.
fn file_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{bar:40.cyan/dim}] {percent}% ({pos}/{len}) {msg}")
            .expect("Invalid progress bar template")
            .progress_chars("##-"),
    );
    pb
}

/// Drive a progress bar from an engine callback.
fn bar_observer(pb: &ProgressBar) -> impl Fn(usize, usize, Option<&str>) + Sync + '_ {
    move |current: usize, total: usize, message: Option<&str>| {
        pb.set_length(total as u64);
        pb.set_position(current as u64);
        if let Some(message) = message {
            pb.set_message(message.to_string());
        }
    }
}

/// Format a byte count as a human-readable size.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, UNITS[unit])
}

// =============================================================================
// Command Handlers
// =============================================================================

/// Pack a tree into a snapshot
pub fn cmd_pack(source: &str, output: &str, compression: u32, include_lockfile: bool) -> Result<()> {
    info!("Packing {} into {}", source, output);
    eprintln!("Scanning {}...", source);

    let options = PackOptions {
        source: PathBuf::from(source),
        output: PathBuf::from(output),
        compression_level: compression,
        include_lockfile,
    };

    let multi = MultiProgress::new();
    let scan_pb = multi.add(file_progress_bar(0));
    let write_pb = multi.add(file_progress_bar(0));
    let scan_observer = bar_observer(&scan_pb);
    let write_observer = bar_observer(&write_pb);

    let summary = pack(&options, Some(&scan_observer), Some(&write_observer))?;
    scan_pb.finish_and_clear();
    write_pb.finish_and_clear();

    println!("Pack complete: {}", summary.output.display());
    println!("  Packages: {}", summary.package_count);
    println!("  Files: {}", summary.file_count);
    println!("  Original size: {}", format_bytes(summary.total_size));
    println!("  Snapshot size: {}", format_bytes(summary.db_size));
    println!("  Compression: {:.1}%", summary.compression_ratio());
    println!("  Deduplicated: {} file(s)", summary.deduplicated);

    Ok(())
}

/// Restore a tree from a snapshot
pub fn cmd_unpack(input: &str, output: &str, force: bool) -> Result<()> {
    let db_path = Path::new(input);
    let output_path = Path::new(output);

    if !db_path.exists() {
        return Err(modvault::Error::DatabaseNotFound(db_path.to_path_buf()).into());
    }

    if output_path.exists() {
        if !force {
            return Err(modvault::Error::OutputExists(output_path.to_path_buf()).into());
        }
        eprintln!("Removing existing {}...", output_path.display());
        fs::remove_dir_all(output_path)?;
    }

    let store = Store::open(db_path)?;

    let created_at = store
        .get_metadata("created_at")?
        .unwrap_or_else(|| "unknown".to_string());
    let blob_stats = store.blob_stats()?;
    println!("Snapshot: {}", db_path.display());
    println!("  Created: {}", created_at);
    println!("  Packages: {}", store.package_count()?);
    println!("  Files: {}", store.file_count()?);
    println!("  Original size: {}", format_bytes(blob_stats.total_original));
    println!("  Compressed size: {}", format_bytes(blob_stats.total_compressed));

    eprintln!("Extracting to {}...", output_path.display());
    let pb = file_progress_bar(store.file_count()? as u64);
    let observer = bar_observer(&pb);

    let start = Instant::now();
    let stats = extract_files(&store, output_path, Some(&observer))?;
    let elapsed = start.elapsed().as_secs_f64();
    pb.finish_and_clear();

    println!(
        "Unpack complete: {} files ({}) in {:.1}s",
        stats.total_files,
        format_bytes(stats.total_size),
        elapsed
    );

    Ok(())
}

/// Compare a snapshot against the live tree
pub fn cmd_status(db: &str, node_modules: &str) -> Result<()> {
    let db_path = Path::new(db);
    let tree_path = Path::new(node_modules);

    if db_path.exists() && !tree_path.exists() {
        eprintln!("Tree not found: {}", tree_path.display());
        eprintln!("Run \"modvault unpack\" to restore it from the snapshot.");
    }

    let pb = file_progress_bar(0);
    let observer = bar_observer(&pb);
    let report = status(db_path, tree_path, Some(&observer))?;
    pb.finish_and_clear();

    println!("Status: {} vs {}", db_path.display(), tree_path.display());
    println!("  Unchanged: {}", report.unchanged);
    println!("  Modified: {}", report.modified.len());
    println!("  Only in snapshot: {}", report.only_in_db.len());

    if !report.modified.is_empty() && report.modified.len() <= 10 {
        println!("\nModified files:");
        for path in &report.modified {
            println!("  M {}", path);
        }
    }
    if !report.only_in_db.is_empty() && report.only_in_db.len() <= 10 {
        println!("\nOnly in snapshot (deleted locally):");
        for path in &report.only_in_db {
            println!("  D {}", path);
        }
    }
    if report.modified.len() > 10 || report.only_in_db.len() > 10 {
        println!("\n(Lists longer than 10 entries are elided.)");
    }

    if report.is_clean() {
        println!("\nAll files match.");
    }

    Ok(())
}
