// tests/common/mod.rs

//! Shared fixture builders for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a package directory: a manifest plus the given (relative path,
/// content) files.
pub fn write_package(dir: &Path, name: &str, version: &str, files: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("package.json"),
        format!(r#"{{"name": "{name}", "version": "{version}"}}"#),
    )
    .unwrap();
    for (rel, content) in files {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

/// A small flat-layout tree:
///
/// - `a` with `index.js` = "hello"
/// - `b` with `x.js` = "duplicate content" and `lib/util.js`
/// - `c` with `x.js` = "duplicate content" (dedups against b)
/// - `@scope/pkg` with `index.js`
///
/// Returns (tempdir, tree root).
pub fn basic_tree() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("node_modules");

    write_package(&root.join("a"), "a", "1.0.0", &[("index.js", "hello")]);
    write_package(
        &root.join("b"),
        "b",
        "2.1.0",
        &[("x.js", "duplicate content"), ("lib/util.js", "util")],
    );
    write_package(&root.join("c"), "c", "0.5.0", &[("x.js", "duplicate content")]);
    write_package(
        &root.join("@scope/pkg"),
        "@scope/pkg",
        "3.0.0",
        &[("index.js", "scoped")],
    );

    (temp, root)
}

/// A symlink-farm (pnpm) tree with one plain and one scoped package.
pub fn pnpm_tree() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("node_modules");

    write_package(
        &root.join(".pnpm/foo@1.0.0/node_modules/foo"),
        "foo",
        "1.0.0",
        &[("index.js", "foo contents")],
    );
    write_package(
        &root.join(".pnpm/@scope+bar@2.0.0/node_modules/@scope/bar"),
        "@scope/bar",
        "2.0.0",
        &[("main.js", "bar contents")],
    );

    (temp, root)
}

/// Collect (tree-relative path, content) for every regular file under root.
pub fn collect_files(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .to_string();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}
