//! Template rendering of included content

use confsource_core::{Error, Params, Result};
use minijinja::{Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// When included content is treated as a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateMode {
    /// Always render, even without parameters.
    #[default]
    Always,
    /// Render only when the retrieval supplies parameters.
    WithParams,
    /// Never render; content is returned byte for byte.
    Never,
}

impl TemplateMode {
    fn applies(self, params: &Params) -> bool {
        match self {
            Self::Always => true,
            Self::WithParams => !params.is_empty(),
            Self::Never => false,
        }
    }
}

/// Render `raw` read from `path` according to `mode`.
///
/// Undefined variables are errors. Either the whole template renders or the
/// call fails; trailing newlines are preserved.
pub fn render(path: &Path, raw: &[u8], params: &Params, mode: TemplateMode) -> Result<Vec<u8>> {
    if !mode.applies(params) {
        return Ok(raw.to_vec());
    }

    let source = match std::str::from_utf8(raw) {
        Ok(source) => source,
        // Binary content without parameters has nothing to substitute.
        Err(_) if params.is_empty() => return Ok(raw.to_vec()),
        Err(e) => {
            return Err(Error::Template {
                path: path.to_path_buf(),
                message: format!("content is not valid UTF-8: {}", e),
            });
        }
    };

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);

    env.render_str(source, params.as_map())
        .map(String::into_bytes)
        .map_err(|e| Error::Template {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}
