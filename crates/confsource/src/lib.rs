//! Pluggable config sources.
//!
//! A config source resolves a selector to configuration content. Sources are
//! created by type-specific [`Factory`] implementations held in a
//! [`FactoryRegistry`], and [`build`] turns a map of named settings into a
//! map of live instances.
//!
//! # Example
//!
//! ```rust,no_run
//! use confsource::{CreateParams, Params, build_from_document};
//!
//! # async fn run() -> confsource::Result<()> {
//! let sources = build_from_document("sources.yaml", &CreateParams::default()).await?;
//! if let Some(include) = sources.get("include") {
//!     let value = include.retrieve("/etc/app/extra.yaml", &Params::new()).await?;
//!     println!("{}", value.as_str()?);
//! }
//! sources.close_all().await?;
//! # Ok(())
//! # }
//! ```

mod builtins;

pub use builtins::{build_from_document, builtin_factories};
pub use confsource_core::{
    ConfigSource, CreateParams, Error, ErrorKind, Factory, FactoryRegistry, Params, Result,
    Retrieved, SourceSettings, Sources, SourcesDocument, WatchHandle, WatchSignal, Watchable,
    build, logging,
};
pub use confsource_include::{
    INCLUDE_TYPE, IncludeSettings, IncludeSource, IncludeSourceFactory, TemplateMode,
};
