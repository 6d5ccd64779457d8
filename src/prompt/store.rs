// src/prompt/store.rs

//! Locates template documents on disk or among the embedded defaults.

use crate::errors::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

/// Templates compiled into the binary, keyed by their relative name.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[(
    "SA/api_analysis.json",
    include_str!("../../templates/SA/api_analysis.json"),
)];

/// Resolves template names to parsed JSON documents.
///
/// A configured directory takes precedence, so users can override a builtin
/// template by placing a file with the same relative name there.
#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    dir: Option<PathBuf>,
}

impl TemplateStore {
    /// A store that only knows the embedded templates.
    pub fn builtin() -> Self {
        Self { dir: None }
    }

    /// A store that looks in `dir` first, then falls back to the embedded templates.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    /// Loads and parses the named template.
    ///
    /// # Errors
    /// `Error::TemplateLoad` if the name is unknown, unreadable, or not valid JSON.
    pub fn load_document(&self, name: &str) -> Result<Value> {
        let load_err = |reason: String| Error::TemplateLoad {
            name: name.to_string(),
            reason,
        };

        if let Some(dir) = &self.dir {
            let path = dir.join(name);
            if path.is_file() {
                log::debug!("Loading prompt template from {}", path.display());
                let text = fs::read_to_string(&path)
                    .map_err(|e| load_err(format!("cannot read {}: {e}", path.display())))?;
                return serde_json::from_str(&text)
                    .map_err(|e| load_err(format!("invalid JSON: {e}")));
            }
        }

        let (_, text) = BUILTIN_TEMPLATES
            .iter()
            .find(|(builtin, _)| *builtin == name)
            .ok_or_else(|| load_err("no such template".to_string()))?;
        serde_json::from_str(text).map_err(|e| load_err(format!("invalid builtin JSON: {e}")))
    }
}
