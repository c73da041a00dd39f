// src/error.rs

//! Central error type for modvault
//!
//! Precondition failures (missing source, missing database, existing
//! output) get their own variants so the CLI can report them verbatim;
//! everything else wraps the underlying library error.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("source tree not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("snapshot database not found: {0}")]
    DatabaseNotFound(PathBuf),

    #[error("output directory already exists: {0} (use --force to overwrite)")]
    OutputExists(PathBuf),

    #[error("store is closed")]
    Closed,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Compression(#[from] crate::compression::CompressionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
