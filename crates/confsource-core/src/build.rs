//! Build orchestration: settings + factories -> live sources

use crate::{ConfigSource, CreateParams, Error, FactoryRegistry, Result, SourceSettings};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

/// Build one live source per named setting.
///
/// Instances are created sequentially in name order. The first failure aborts
/// the whole build: sources created so far are closed and no partial map is
/// returned.
pub async fn build(
    settings: &BTreeMap<String, SourceSettings>,
    params: &CreateParams,
    factories: &FactoryRegistry,
) -> Result<Sources> {
    let mut built: BTreeMap<String, Arc<dyn ConfigSource>> = BTreeMap::new();

    for (name, source_settings) in settings {
        match build_one(name, source_settings, params, factories).await {
            Ok(source) => {
                built.insert(name.clone(), source);
            }
            Err(err) => {
                tracing::warn!(config_source = %name, error = %err, "Config source build failed");
                close_partial(built).await;
                return Err(err);
            }
        }
    }

    tracing::info!(count = built.len(), "Built config sources");
    Ok(Sources { sources: built })
}

async fn build_one(
    name: &str,
    settings: &SourceSettings,
    params: &CreateParams,
    factories: &FactoryRegistry,
) -> Result<Arc<dyn ConfigSource>> {
    let kind = settings.source_type(name)?;
    let factory = factories.get(kind).ok_or_else(|| Error::UnknownSourceType {
        kind: kind.to_string(),
        name: name.to_string(),
    })?;

    let instance = params.for_instance(name);
    let span = instance.span.clone();
    let created = factory
        .create(&instance, settings)
        .instrument(span)
        .await
        .map_err(|e| Error::CreateFailed {
            name: name.to_string(),
            source: Box::new(e),
        })?;

    created.ok_or_else(|| Error::NoSourceProduced {
        name: name.to_string(),
    })
}

async fn close_partial(built: BTreeMap<String, Arc<dyn ConfigSource>>) {
    for (name, source) in built {
        if let Err(e) = source.close().await {
            tracing::warn!(config_source = %name, error = %e, "Failed to close config source after build failure");
        }
    }
}

/// Immutable map from instance name to live source, produced by [`build`].
#[derive(Clone, Default)]
pub struct Sources {
    sources: BTreeMap<String, Arc<dyn ConfigSource>>,
}

impl Sources {
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ConfigSource>> {
        self.sources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Instance names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.sources.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn ConfigSource>)> {
        self.sources.iter().map(|(name, source)| (name.as_str(), source))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Close every source, returning the first error after trying them all.
    pub async fn close_all(&self) -> Result<()> {
        let mut first_error = None;
        for (name, source) in &self.sources {
            if let Err(e) = source.close().await {
                tracing::warn!(config_source = %name, error = %e, "Failed to close config source");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Sources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sources")
            .field("names", &self.names())
            .finish()
    }
}
