//! Factories and the registry mapping type identifiers to them

use crate::{ConfigSource, CreateParams, Error, Result, SourceSettings};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Constructs config sources of one type from their settings.
#[async_trait]
pub trait Factory: Send + Sync {
    /// Type identifier this factory is registered under, e.g. `include`.
    fn source_type(&self) -> &str;

    /// Create a source for the instance named in `params`.
    ///
    /// `Ok(None)` means the factory produced nothing usable; the build
    /// treats it as a configuration error for that instance.
    async fn create(
        &self,
        params: &CreateParams,
        settings: &SourceSettings,
    ) -> Result<Option<Arc<dyn ConfigSource>>>;
}

/// Registry mapping type identifiers to factories.
///
/// Populated once while the process is configured and read-only afterwards.
///
/// # Example
///
/// ```
/// use confsource_core::FactoryRegistry;
///
/// let registry = FactoryRegistry::new();
/// assert!(registry.is_empty());
/// assert!(registry.get("include").is_none());
/// ```
#[derive(Default, Clone)]
pub struct FactoryRegistry {
    factories: HashMap<String, Arc<dyn Factory>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from a list of factories.
    pub fn with_factories<I>(factories: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn Factory>>,
    {
        let mut registry = Self::new();
        for factory in factories {
            registry.register(factory)?;
        }
        Ok(registry)
    }

    /// Register a factory under its type identifier.
    ///
    /// Fails if another factory already claims the same type.
    pub fn register(&mut self, factory: Arc<dyn Factory>) -> Result<()> {
        let kind = factory.source_type().to_string();
        if self.factories.contains_key(&kind) {
            return Err(Error::DuplicateFactory { kind });
        }
        tracing::debug!(%kind, "Registered config source factory");
        self.factories.insert(kind, factory);
        Ok(())
    }

    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Factory>> {
        self.factories.get(kind)
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered type identifiers, sorted.
    pub fn list_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("types", &self.list_types())
            .finish()
    }
}
