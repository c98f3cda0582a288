//! Factory for `include` config sources

use crate::settings::IncludeSettings;
use crate::source::IncludeSource;
use async_trait::async_trait;
use confsource_core::{ConfigSource, CreateParams, Factory, Result, SourceSettings};
use std::sync::Arc;

/// Type identifier of the include source.
pub const INCLUDE_TYPE: &str = "include";

/// Creates [`IncludeSource`] instances from `include` settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct IncludeSourceFactory;

impl IncludeSourceFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Factory for IncludeSourceFactory {
    fn source_type(&self) -> &str {
        INCLUDE_TYPE
    }

    async fn create(
        &self,
        params: &CreateParams,
        settings: &SourceSettings,
    ) -> Result<Option<Arc<dyn ConfigSource>>> {
        let include: IncludeSettings = settings.decode(&params.name)?;
        include.validate(&params.name)?;
        tracing::debug!(
            watch_files = include.watch_files,
            delete_files = include.delete_files,
            "Creating include config source"
        );
        Ok(Some(Arc::new(IncludeSource::new(include, params.span.clone()))))
    }
}
