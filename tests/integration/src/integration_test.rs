//! End-to-end integration test for config sources
//!
//! This test exercises the complete flow: settings document -> build -> retrieve -> watch -> close.

use async_trait::async_trait;
use confsource::{
    ConfigSource, CreateParams, Error, ErrorKind, Factory, FactoryRegistry, IncludeSourceFactory,
    Params, Result, Retrieved, SourceSettings, SourcesDocument, WatchSignal, build,
    build_from_document, builtin_factories,
};
use confsource_test_utils::TestDir;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(5);

/// Set up a directory with a settings document and two included files.
fn setup_sources(document_name: &str, document: &str) -> TestDir {
    let dir = TestDir::new();
    dir.write("values/endpoint.yaml", "endpoint: {{ host }}:{{ port }}\n");
    dir.write("values/level", "debug");
    dir.write(document_name, document);
    dir
}

const YAML_DOCUMENT: &str = r#"
config_sources:
  include:
  include/watched:
    watch_files: true
    poll_interval_ms: 20
  include/oneshot:
    delete_files: true
"#;

#[tokio::test]
async fn test_build_from_yaml_document() {
    let dir = setup_sources("sources.yaml", YAML_DOCUMENT);

    let sources = build_from_document(dir.path("sources.yaml"), &CreateParams::default())
        .await
        .unwrap();

    assert_eq!(
        sources.names(),
        vec!["include", "include/oneshot", "include/watched"]
    );

    let include = sources.get("include").unwrap();
    let params = Params::new().with("host", "localhost").with("port", 4317);
    let endpoint = include
        .retrieve(&dir.selector("values/endpoint.yaml"), &params)
        .await
        .unwrap();
    assert_eq!(endpoint.as_str().unwrap(), "endpoint: localhost:4317\n");

    let decoded: BTreeMap<String, String> = endpoint.parse_yaml().unwrap();
    assert_eq!(decoded["endpoint"], "localhost:4317");

    sources.close_all().await.unwrap();
}

#[tokio::test]
async fn test_build_from_toml_document() {
    let dir = setup_sources(
        "sources.toml",
        r#"
[config_sources.files]
type = "include"
template = "never"
"#,
    );

    let sources = build_from_document(dir.path("sources.toml"), &CreateParams::default())
        .await
        .unwrap();

    let files = sources.get("files").unwrap();
    let raw = files
        .retrieve(&dir.selector("values/endpoint.yaml"), &Params::new())
        .await
        .unwrap();
    assert_eq!(raw.as_str().unwrap(), "endpoint: {{ host }}:{{ port }}\n");

    sources.close_all().await.unwrap();
}

#[tokio::test]
async fn test_watch_and_oneshot_lifecycle() {
    let dir = setup_sources("sources.yaml", YAML_DOCUMENT);
    let sources = build_from_document(dir.path("sources.yaml"), &CreateParams::default())
        .await
        .unwrap();

    // Watched source: change is observed, re-retrieve returns the new value.
    let watched = sources.get("include/watched").unwrap();
    let level = watched
        .retrieve(&dir.selector("values/level"), &Params::new())
        .await
        .unwrap();
    assert_eq!(level.as_str().unwrap(), "debug");

    dir.write("values/level", "info");
    let signal = level
        .watch()
        .unwrap()
        .wait_for_update_timeout(WAIT)
        .await
        .unwrap();
    assert_eq!(signal, WatchSignal::Updated);
    let level = watched
        .retrieve(&dir.selector("values/level"), &Params::new())
        .await
        .unwrap();
    assert_eq!(level.as_str().unwrap(), "info");

    // Oneshot source: the file is consumed.
    let oneshot = sources.get("include/oneshot").unwrap();
    let consumed = oneshot
        .retrieve(&dir.selector("values/level"), &Params::new())
        .await
        .unwrap();
    assert_eq!(consumed.as_str().unwrap(), "info");
    assert!(!consumed.is_watchable());
    dir.assert_file_not_exists("values/level");

    // The watcher sees the deletion, then close releases later waits.
    let signal = level
        .watch()
        .unwrap()
        .wait_for_update_timeout(WAIT)
        .await
        .unwrap();
    assert_eq!(signal, WatchSignal::Updated);

    sources.close_all().await.unwrap();
    let signal = level.watch().unwrap().wait_for_update().await.unwrap();
    assert_eq!(signal, WatchSignal::Closed);

    let err = watched
        .retrieve(&dir.selector("values/endpoint.yaml"), &Params::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Closed);
}

#[tokio::test]
async fn test_unknown_type_yields_no_sources() {
    let dir = setup_sources(
        "sources.yaml",
        r#"
config_sources:
  include:
  vault/secrets:
    address: https://vault.local
"#,
    );

    let err = build_from_document(dir.path("sources.yaml"), &CreateParams::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UnknownSourceType { ref kind, ref name } if kind == "vault" && name == "vault/secrets"));
    assert_eq!(err.to_string(), "unknown vault config source type for vault/secrets");
}

#[tokio::test]
async fn test_invalid_include_settings_are_wrapped() {
    let dir = setup_sources(
        "sources.yaml",
        r#"
config_sources:
  include:
    watch_file: true
"#,
    );

    let err = build_from_document(dir.path("sources.yaml"), &CreateParams::default())
        .await
        .unwrap_err();

    match err {
        Error::CreateFailed { name, source } => {
            assert_eq!(name, "include");
            assert!(matches!(*source, Error::InvalidSettings { .. }));
        }
        other => panic!("Expected CreateFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_document_is_not_found() {
    let dir = TestDir::new();

    let err = build_from_document(dir.path("absent.yaml"), &CreateParams::default())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

/// Source that serves a fixed value and records closes.
struct StaticSource {
    value: String,
    closed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ConfigSource for StaticSource {
    async fn retrieve(&self, _selector: &str, _params: &Params) -> Result<Retrieved> {
        Ok(Retrieved::new(self.value.clone()))
    }

    async fn close(&self) -> Result<()> {
        self.closed.lock().push(self.value.clone());
        Ok(())
    }
}

struct StaticFactory {
    closed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Factory for StaticFactory {
    fn source_type(&self) -> &str {
        "static"
    }

    async fn create(
        &self,
        params: &CreateParams,
        _settings: &SourceSettings,
    ) -> Result<Option<Arc<dyn ConfigSource>>> {
        Ok(Some(Arc::new(StaticSource {
            value: params.name.clone(),
            closed: Arc::clone(&self.closed),
        })))
    }
}

#[tokio::test]
async fn test_custom_factory_alongside_builtins() {
    let closed = Arc::new(Mutex::new(Vec::new()));
    let mut registry = builtin_factories().unwrap();
    registry
        .register(Arc::new(StaticFactory {
            closed: Arc::clone(&closed),
        }))
        .unwrap();

    let document: SourcesDocument = load_document(
        r#"
config_sources:
  include:
  static/a:
  static/b:
"#,
    );
    let sources = build(&document.config_sources, &CreateParams::default(), &registry)
        .await
        .unwrap();
    assert_eq!(sources.len(), 3);

    let value = sources
        .get("static/b")
        .unwrap()
        .retrieve("ignored", &Params::new())
        .await
        .unwrap();
    assert_eq!(value.as_str().unwrap(), "static/b");

    sources.close_all().await.unwrap();
    assert_eq!(*closed.lock(), vec!["static/a", "static/b"]);
}

#[test]
fn test_registering_include_twice_fails() {
    let mut registry: FactoryRegistry = builtin_factories().unwrap();
    let err = registry
        .register(Arc::new(IncludeSourceFactory::new()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

fn load_document(text: &str) -> SourcesDocument {
    let dir = TestDir::new();
    dir.write("document.yaml", text);
    SourcesDocument::load(&dir.path("document.yaml")).unwrap()
}
