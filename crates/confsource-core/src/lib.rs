//! Config source contract, factory registry and build orchestration.
//!
//! A configuration document declares named source instances under
//! `config_sources`. Each entry is turned into a live [`ConfigSource`] by the
//! [`Factory`] registered for its type, and placeholders in the document are
//! later resolved by calling [`ConfigSource::retrieve`] on the named source.
//!
//! # Architecture
//!
//! 1. [`SourceSettings`] - declarative, per-instance settings keyed by name.
//! 2. [`FactoryRegistry`] - maps a type identifier to its [`Factory`].
//! 3. [`build`] - constructs every named source, all-or-nothing.
//! 4. [`Retrieved`] - the value of one retrieval, optionally carrying a
//!    [`WatchHandle`] that blocks until the value changes.

pub mod build;
pub mod error;
pub mod factory;
pub mod logging;
pub mod params;
pub mod retrieved;
pub mod settings;
pub mod source;

pub use build::{Sources, build};
pub use error::{Error, ErrorKind, Result};
pub use factory::{Factory, FactoryRegistry};
pub use params::{CreateParams, Params};
pub use retrieved::{Retrieved, WatchHandle, WatchSignal, Watchable};
pub use settings::{SourceSettings, SourcesDocument};
pub use source::ConfigSource;
