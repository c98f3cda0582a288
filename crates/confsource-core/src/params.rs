//! Retrieval parameters and per-instance creation parameters

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::Span;

/// Named values supplied with a retrieval, e.g. template variables.
///
/// # Example
///
/// ```
/// use confsource_core::Params;
///
/// let params = Params::new().with("glob_pattern", "myPattern");
/// assert_eq!(params.get("glob_pattern").and_then(|v| v.as_str()), Some("myPattern"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, replacing any previous value for `key`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Parameters handed to a factory when it creates a source.
///
/// The span carries the `config_source` field once [`CreateParams::for_instance`]
/// has been applied, so events logged by the factory and the source it builds
/// are attributable to the instance.
#[derive(Debug, Clone)]
pub struct CreateParams {
    /// Name of the instance being created; empty for shared parameters.
    pub name: String,
    /// Span under which the instance logs.
    pub span: Span,
}

impl Default for CreateParams {
    fn default() -> Self {
        Self {
            name: String::new(),
            span: Span::current(),
        }
    }
}

impl CreateParams {
    pub fn new(span: Span) -> Self {
        Self {
            name: String::new(),
            span,
        }
    }

    /// Derive the parameters for one named instance.
    pub fn for_instance(&self, name: &str) -> Self {
        let span = tracing::info_span!(parent: &self.span, "config_source", config_source = %name);
        Self {
            name: name.to_string(),
            span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_params_is_empty() {
        let params = Params::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_with_replaces_existing() {
        let params = Params::new().with("port", 80).with("port", 8080);
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("port"), Some(&json!(8080)));
    }

    #[test]
    fn test_from_iter_accepts_scalars() {
        let params: Params = [("enabled", json!(true)), ("name", json!("svc"))]
            .into_iter()
            .collect();
        assert_eq!(params.get("enabled"), Some(&json!(true)));
        assert_eq!(params.get("name"), Some(&json!("svc")));
    }

    #[test]
    fn test_deserializes_from_yaml_mapping() {
        let params: Params = serde_yaml::from_str("glob_pattern: myPattern\nretries: 3").unwrap();
        assert_eq!(params.get("glob_pattern"), Some(&json!("myPattern")));
        assert_eq!(params.get("retries"), Some(&json!(3)));
    }

    #[test]
    fn test_for_instance_sets_name() {
        let shared = CreateParams::default();
        let instance = shared.for_instance("include/secrets");
        assert_eq!(instance.name, "include/secrets");
        assert!(shared.name.is_empty());
    }
}
