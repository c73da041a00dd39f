// src/compression/mod.rs

//! Gzip compression for blob storage
//!
//! Blobs are stored in the gzip member format. The compression level is a
//! pack-time choice (1 = fastest, 9 = smallest); decompression needs no
//! parameters because the format is self-describing.

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Compression-related errors
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Failed to compress data: {0}")]
    Compress(#[source] io::Error),

    #[error("Failed to decompress gzip data: {0}")]
    Decompress(#[source] io::Error),
}

/// Compress a byte slice into a gzip member.
///
/// Levels outside 1..=9 are clamped into that range.
pub fn compress(data: &[u8], level: u32) -> Result<Vec<u8>, CompressionError> {
    let level = level.clamp(1, 9);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).map_err(CompressionError::Compress)?;
    encoder.finish().map_err(CompressionError::Compress)
}

/// Decompress a gzip member back into the original bytes.
///
/// Fails on malformed input.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let mut decoder = GzDecoder::new(data);
    let mut output = Vec::new();
    decoder
        .read_to_end(&mut output)
        .map_err(CompressionError::Decompress)?;
    Ok(output)
}
