//! Filesystem layer for configuration sources
//!
//! Provides path-aware I/O errors, whole-file reads and removal, content
//! fingerprints for change detection, and a format-detecting document loader.

pub mod document;
pub mod error;
pub mod fingerprint;
pub mod io;

pub use document::DocumentStore;
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, compute_content_checksum};
