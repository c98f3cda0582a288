//! Content fingerprints for change detection
//!
//! A fingerprint pairs the content length with a SHA-256 checksum in the
//! canonical `sha256:<hex>` format, so edits that keep the size and land
//! within one mtime tick are still seen as changes.

use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::Path;

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the SHA-256 checksum of raw content.
///
/// Returns a string in the canonical format `"sha256:<hex>"`.
pub fn compute_content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Observed state of a file at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    /// The file does not exist.
    Missing,
    /// The file exists with the given length and checksum.
    Present { len: u64, checksum: String },
}

impl Fingerprint {
    pub fn of_bytes(content: &[u8]) -> Self {
        Self::Present {
            len: content.len() as u64,
            checksum: compute_content_checksum(content),
        }
    }

    /// Build a fingerprint from the outcome of reading a file.
    ///
    /// A missing file is a valid observation; any other failure is returned.
    pub fn from_read(result: std::io::Result<Vec<u8>>) -> std::io::Result<Self> {
        match result {
            Ok(content) => Ok(Self::of_bytes(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::Missing),
            Err(e) => Err(e),
        }
    }

    /// Fingerprint the file currently at `path`.
    pub fn of_file(path: &Path) -> std::io::Result<Self> {
        Self::from_read(std::fs::read(path))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}
