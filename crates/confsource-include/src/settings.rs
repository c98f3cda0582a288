//! Settings for include config source instances

use crate::template::TemplateMode;
use confsource_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

/// Type-specific settings of an `include` source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeSettings {
    /// Expose retrieved values as watchable.
    #[serde(default)]
    pub watch_files: bool,

    /// Delete each file after it was read and rendered successfully.
    /// Takes precedence over `watch_files`.
    #[serde(default)]
    pub delete_files: bool,

    /// When content is rendered as a template.
    #[serde(default)]
    pub template: TemplateMode,

    /// How often watched files are checked for changes when filesystem
    /// events are unavailable. With events, a safety check runs every eight
    /// intervals.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for IncludeSettings {
    fn default() -> Self {
        Self {
            watch_files: false,
            delete_files: false,
            template: TemplateMode::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl IncludeSettings {
    pub fn watching() -> Self {
        Self {
            watch_files: true,
            ..Self::default()
        }
    }

    pub fn deleting() -> Self {
        Self {
            delete_files: true,
            ..Self::default()
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check the settings of the instance called `name`.
    pub fn validate(&self, name: &str) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::InvalidSettings {
                name: name.to_string(),
                message: "poll_interval_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
