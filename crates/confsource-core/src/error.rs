//! Error types for confsource-core
//!
//! One taxonomy is shared by every source so callers can tell configuration
//! failures, retrieval failures and cleanup failures apart by kind.

use std::path::PathBuf;

/// Result type for confsource-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or using config sources
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No factory is registered for the instance's type
    #[error("unknown {kind} config source type for {name}")]
    UnknownSourceType { kind: String, name: String },

    /// Neither an explicit `type` nor a name prefix identifies the type
    #[error("config source {name} does not declare a type")]
    MissingSourceType { name: String },

    /// The factory returned an error
    #[error("failed to create config source {name}: {source}")]
    CreateFailed {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// The factory succeeded but handed back no instance
    #[error("factory for {name:?} produced no config source")]
    NoSourceProduced { name: String },

    /// Type-specific settings could not be decoded
    #[error("invalid settings for config source {name}: {message}")]
    InvalidSettings { name: String, message: String },

    /// Two factories claim the same type identifier
    #[error("config source type {kind} is already registered")]
    DuplicateFactory { kind: String },

    /// Reading the selected resource failed; the OS error kind is preserved
    #[error(transparent)]
    Fs(#[from] confsource_fs::Error),

    /// Template parsing or rendering failed
    #[error("failed to render template {path}: {message}")]
    Template { path: PathBuf, message: String },

    /// The value was read but the backing file could not be removed
    #[error("failed to delete file {path}: {source}")]
    DeleteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The retrieved value does not have the requested shape
    #[error("failed to decode retrieved value: {message}")]
    Decode { message: String },

    /// The source was closed before or during the call
    #[error("config source is closed")]
    SourceClosed,

    /// Another caller is already waiting for updates on this path
    #[error("a wait for update is already in progress for {path}")]
    WatchInProgress { path: PathBuf },
}

/// Coarse classification of [`Error`] for callers that branch on outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    NotFound,
    Io,
    Template,
    DeleteFailed,
    Decode,
    Closed,
    WatchInProgress,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownSourceType { .. }
            | Self::MissingSourceType { .. }
            | Self::CreateFailed { .. }
            | Self::NoSourceProduced { .. }
            | Self::InvalidSettings { .. }
            | Self::DuplicateFactory { .. } => ErrorKind::Configuration,
            Self::Fs(err) if err.is_not_found() => ErrorKind::NotFound,
            Self::Fs(_) => ErrorKind::Io,
            Self::Template { .. } => ErrorKind::Template,
            Self::DeleteFailed { .. } => ErrorKind::DeleteFailed,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::SourceClosed => ErrorKind::Closed,
            Self::WatchInProgress { .. } => ErrorKind::WatchInProgress,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The platform error kind behind an I/O or delete failure.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Fs(err) => err.io_kind(),
            Self::DeleteFailed { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Reclassify a failed removal as a cleanup failure.
    pub fn delete_failed(err: confsource_fs::Error) -> Self {
        match err {
            confsource_fs::Error::Io { path, source } => Self::DeleteFailed { path, source },
            other => Self::Fs(other),
        }
    }
}
