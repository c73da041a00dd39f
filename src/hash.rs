// src/hash.rs

//! SHA-256 content hashing
//!
//! Every blob in a snapshot is keyed by the SHA-256 digest of its
//! *uncompressed* bytes, and `status` re-hashes on-disk files against the
//! stored digests. Digests are always the lowercase hexadecimal encoding.

use sha2::{Digest, Sha256};
use std::io::{self, Read};

/// Compute the SHA-256 digest of a byte slice as a lowercase hex string.
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 digest of a string's UTF-8 bytes.
#[inline]
pub fn sha256_str(data: &str) -> String {
    sha256(data.as_bytes())
}

/// Compute the SHA-256 digest of data from a reader.
///
/// Streams the content in 8 KiB chunks to avoid loading it entirely into
/// memory.
pub fn sha256_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
