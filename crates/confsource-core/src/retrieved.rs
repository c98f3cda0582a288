//! Retrieved values and the optional watch capability

use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of waiting for a watched value to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchSignal {
    /// The underlying resource changed; retrieve it again.
    Updated,
    /// The owning source was closed. Terminal: every later wait returns this too.
    Closed,
    /// The caller's deadline elapsed first. Pending changes are kept.
    TimedOut,
}

/// State that can block a caller until the value it backs changes.
///
/// Implemented by sources that support watching. Consumers go through
/// [`WatchHandle`] instead of holding the state directly.
#[async_trait]
pub trait Watchable: Send + Sync {
    /// Wait until the resource changes or the owning source is closed.
    ///
    /// Must be cancel-safe: dropping the future releases the wait.
    async fn wait_for_update(&self) -> Result<WatchSignal>;
}

/// Handle to the watch of one retrieval.
///
/// Clones share the same watch. The handle does not keep the source's state
/// alive: once the source is closed or dropped it reports
/// [`WatchSignal::Closed`]. When the last clone is dropped the source may
/// stop watching the resource.
#[derive(Clone)]
pub struct WatchHandle {
    target: Arc<dyn Watchable>,
}

impl WatchHandle {
    pub fn new<W: Watchable + 'static>(target: W) -> Self {
        Self {
            target: Arc::new(target),
        }
    }

    /// Block until the value is updated or the owning source closes.
    pub async fn wait_for_update(&self) -> Result<WatchSignal> {
        self.target.wait_for_update().await
    }

    /// Like [`WatchHandle::wait_for_update`], giving up after `timeout`.
    pub async fn wait_for_update_timeout(&self, timeout: Duration) -> Result<WatchSignal> {
        match tokio::time::timeout(timeout, self.wait_for_update()).await {
            Ok(outcome) => outcome,
            Err(_) => Ok(WatchSignal::TimedOut),
        }
    }
}

impl fmt::Debug for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchHandle")
            .field("clones", &Arc::strong_count(&self.target))
            .finish()
    }
}

/// The value produced by one retrieval.
///
/// Whether the value can be watched is explicit: [`Retrieved::watch`] is
/// `Some` only when the source watches and the resource is still there.
#[derive(Debug, Clone)]
pub struct Retrieved {
    value: Vec<u8>,
    watch: Option<WatchHandle>,
}

impl Retrieved {
    pub fn new(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: value.into(),
            watch: None,
        }
    }

    pub fn watched(value: impl Into<Vec<u8>>, watch: WatchHandle) -> Self {
        Self {
            value: value.into(),
            watch: Some(watch),
        }
    }

    /// Raw bytes of the value.
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_value(self) -> Vec<u8> {
        self.value
    }

    /// The value as UTF-8 text.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.value).map_err(|e| Error::Decode {
            message: e.to_string(),
        })
    }

    /// Decode the value as YAML, which also covers JSON and bare scalars.
    pub fn parse_yaml<T: DeserializeOwned>(&self) -> Result<T> {
        serde_yaml::from_slice(&self.value).map_err(|e| Error::Decode {
            message: e.to_string(),
        })
    }

    pub fn watch(&self) -> Option<&WatchHandle> {
        self.watch.as_ref()
    }

    pub fn is_watchable(&self) -> bool {
        self.watch.is_some()
    }
}
