//! Declarative settings for named config source instances

use crate::{Error, Result};
use confsource_fs::DocumentStore;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Settings for one config source instance.
///
/// The instance name is the key under which the settings appear; it is not
/// stored here. Everything besides `type` is type-specific and decoded by the
/// factory with [`SourceSettings::decode`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    /// Explicit type identifier. When absent the type is taken from the
    /// instance name up to the first `/`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// Type-specific fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SourceSettings {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            fields: Map::new(),
        }
    }

    /// Set a type-specific field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Resolve the type identifier for the instance called `name`.
    ///
    /// `include/secrets` without an explicit `type` resolves to `include`.
    pub fn source_type<'a>(&'a self, name: &'a str) -> Result<&'a str> {
        let kind = match &self.kind {
            Some(kind) => kind.as_str(),
            None => name.split('/').next().unwrap_or(""),
        };
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(Error::MissingSourceType {
                name: name.to_string(),
            });
        }
        Ok(kind)
    }

    /// Decode the type-specific fields into the factory's settings type.
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            Error::InvalidSettings {
                name: name.to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// The part of a configuration document that declares config sources.
///
/// Other top-level keys are ignored so the whole service document can be
/// loaded directly.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourcesDocument {
    #[serde(default, deserialize_with = "deserialize_sources")]
    pub config_sources: BTreeMap<String, SourceSettings>,
}

impl SourcesDocument {
    /// Load from a `.toml`, `.json`, `.yaml` or `.yml` file.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(DocumentStore::new().load(path)?)
    }
}

// `include:` with no body is an instance with default settings.
fn deserialize_sources<'de, D>(deserializer: D) -> std::result::Result<BTreeMap<String, SourceSettings>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Option<SourceSettings>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(name, settings)| (name, settings.unwrap_or_default()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("include", None, "include")]
    #[case("include/secrets", None, "include")]
    #[case("secrets", Some("include"), "include")]
    #[case("include/a/b", None, "include")]
    fn test_source_type_resolution(
        #[case] name: &str,
        #[case] kind: Option<&str>,
        #[case] expected: &str,
    ) {
        let settings = SourceSettings {
            kind: kind.map(String::from),
            fields: Map::new(),
        };
        assert_eq!(settings.source_type(name).unwrap(), expected);
    }

    #[rstest]
    #[case("/secrets", None)]
    #[case("secrets", Some("  "))]
    fn test_missing_source_type(#[case] name: &str, #[case] kind: Option<&str>) {
        let settings = SourceSettings {
            kind: kind.map(String::from),
            fields: Map::new(),
        };
        assert!(matches!(
            settings.source_type(name),
            Err(Error::MissingSourceType { .. })
        ));
    }

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Typed {
        #[serde(default)]
        watch_files: bool,
    }

    #[test]
    fn test_decode_typed_fields() {
        let settings = SourceSettings::new("include").with_field("watch_files", true);
        let typed: Typed = settings.decode("include").unwrap();
        assert_eq!(typed, Typed { watch_files: true });
    }

    #[test]
    fn test_decode_rejects_unknown_field_with_name() {
        let settings = SourceSettings::new("include").with_field("wach_files", true);
        let err = settings.decode::<Typed>("include/x").unwrap_err();
        match err {
            Error::InvalidSettings { name, message } => {
                assert_eq!(name, "include/x");
                assert!(message.contains("wach_files"));
            }
            other => panic!("expected InvalidSettings, got {:?}", other),
        }
    }

    #[test]
    fn test_document_from_yaml() {
        let yaml = r#"
config_sources:
  include:
  include/secrets:
    delete_files: true
  files:
    type: include
    watch_files: true
receivers:
  otlp: {}
"#;
        let doc: SourcesDocument = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(doc.config_sources.len(), 3);
        assert_eq!(doc.config_sources["include"], SourceSettings::default());
        assert_eq!(
            doc.config_sources["include/secrets"].fields.get("delete_files"),
            Some(&json!(true))
        );
        assert_eq!(doc.config_sources["files"].kind.as_deref(), Some("include"));
        assert!(!doc.config_sources["files"].fields.contains_key("type"));
    }

    #[test]
    fn test_document_without_sources() {
        let doc: SourcesDocument = serde_yaml::from_str("receivers: {}").unwrap();
        assert!(doc.config_sources.is_empty());
    }

    #[test]
    fn test_document_from_toml() {
        let toml_doc = r#"
[config_sources.include]
watch_files = true

[config_sources."include/secrets"]
delete_files = true
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(&path, toml_doc).unwrap();

        let doc = SourcesDocument::load(&path).unwrap();
        assert_eq!(
            doc.config_sources["include"].fields.get("watch_files"),
            Some(&json!(true))
        );
        assert_eq!(
            doc.config_sources["include/secrets"].source_type("include/secrets").unwrap(),
            "include"
        );
    }
}
