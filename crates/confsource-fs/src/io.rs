//! Whole-file reads and removal for file-backed sources

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read the entire file at `path`.
///
/// The OS error is kept intact so callers can classify it by kind.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| Error::io(path, e))
}

/// Read the entire file at `path` as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Remove the file at `path`.
pub fn remove_file(path: &Path) -> Result<()> {
    fs::remove_file(path).map_err(|e| Error::io(path, e))?;
    tracing::debug!(?path, "Removed file");
    Ok(())
}

/// Stable identity for a path, used to share state between spellings of the
/// same file (`./a.yaml` and `a.yaml`).
///
/// Falls back to the path as given when it cannot be canonicalized.
pub fn canonical_key(path: &Path) -> PathBuf {
    dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
