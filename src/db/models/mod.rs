// src/db/models/mod.rs

//! Data models for snapshot database entities
//!
//! Each struct corresponds to a table and carries its own insert/query
//! methods taking a `&Connection`, so the same code runs against a plain
//! connection or inside a transaction.

mod blob;
mod file;
mod package;

pub use blob::{Blob, BlobStats};
pub use file::{FileRow, FileRowWithPackage};
pub use package::Package;
