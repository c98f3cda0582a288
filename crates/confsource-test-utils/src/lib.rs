//! Shared test utilities for the confsource workspace.
//!
//! This crate provides standardised fixtures so crate test suites do not each
//! re-implement scratch directories and deletion-blocking tricks. It is a
//! dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`dir`] - [`TestDir`] scratch directory with writers and assertions
//! - [`lock`] - [`DeleteBlocker`] keeps a file from being deleted

pub mod dir;
pub mod lock;

pub use dir::TestDir;
pub use lock::{DeleteBlocker, is_root};
