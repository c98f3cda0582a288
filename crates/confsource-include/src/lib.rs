//! File include config source.
//!
//! Resolves a selector (a filesystem path) to the file's content, optionally
//! rendering it as a template against the retrieval parameters, deleting it
//! after a successful read, or watching it for changes.
//!
//! ```yaml
//! config_sources:
//!   include:
//!     watch_files: true
//!   include/secrets:
//!     delete_files: true
//! ```

pub mod factory;
pub mod settings;
pub mod source;
pub mod template;
pub mod watch;

pub use factory::{INCLUDE_TYPE, IncludeSourceFactory};
pub use settings::IncludeSettings;
pub use source::IncludeSource;
pub use template::TemplateMode;
pub use watch::{WatchLease, WatchPhase, WatchState};
