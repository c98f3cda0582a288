//! Registry of the sources shipped with this crate

use confsource_core::{CreateParams, Factory, FactoryRegistry, Result, Sources, SourcesDocument, build};
use confsource_include::IncludeSourceFactory;
use std::path::Path;
use std::sync::Arc;

/// A registry holding every built-in factory.
pub fn builtin_factories() -> Result<FactoryRegistry> {
    let builtins: Vec<Arc<dyn Factory>> = vec![Arc::new(IncludeSourceFactory::new())];
    FactoryRegistry::with_factories(builtins)
}

/// Load the `config_sources` section from a YAML, TOML or JSON document
/// and build it with the built-in factories.
pub async fn build_from_document(path: impl AsRef<Path>, params: &CreateParams) -> Result<Sources> {
    let path = path.as_ref();
    let document = SourcesDocument::load(path)?;
    tracing::debug!(?path, count = document.config_sources.len(), "Loaded config source settings");
    build(&document.config_sources, params, &builtin_factories()?).await
}
