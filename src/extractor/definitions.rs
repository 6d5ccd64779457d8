// src/extractor/definitions.rs

//! Turns symbol names into definition snippets for prompt context.

use super::DefinitionLookup;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// One candidate definition reported by the lookup tool.
///
/// Only `definition_code` is required; the remaining fields are kept for
/// logging.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DefinitionCandidate {
    pub definition_code: String,
    #[serde(default)]
    pub symbol_name: Option<String>,
    #[serde(default)]
    pub definition_type: Option<String>,
    #[serde(default)]
    pub code_pos: Option<String>,
}

/// Resolves symbols of one project through a [`DefinitionLookup`].
#[derive(Clone)]
pub struct DefinitionResolver {
    project_root: PathBuf,
    lookup: Arc<dyn DefinitionLookup>,
}

impl std::fmt::Debug for DefinitionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionResolver")
            .field("project_root", &self.project_root)
            .finish_non_exhaustive()
    }
}

impl DefinitionResolver {
    pub fn new(project_root: impl Into<PathBuf>, lookup: Arc<dyn DefinitionLookup>) -> Self {
        Self {
            project_root: project_root.into(),
            lookup,
        }
    }

    /// Returns the first candidate's source code, or `None` when the tool
    /// found nothing.
    ///
    /// # Errors
    /// `Error::DefinitionLookup` if the tool failed or its output is not a
    /// JSON array of candidates.
    pub fn resolve(&self, symbol: &str) -> Result<Option<String>> {
        let raw = self.lookup.lookup(&self.project_root, symbol)?;
        let candidates: Vec<DefinitionCandidate> =
            serde_json::from_str(raw.trim()).map_err(|e| Error::DefinitionLookup {
                symbol: symbol.to_string(),
                reason: format!("malformed lookup response: {e}"),
            })?;

        if let Some(first) = candidates.first() {
            log::debug!(
                "Resolved {} ({}) at {}",
                symbol,
                first.definition_type.as_deref().unwrap_or("?"),
                first.code_pos.as_deref().unwrap_or("?")
            );
        }
        Ok(candidates.into_iter().next().map(|c| c.definition_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    struct Canned(&'static str);

    impl DefinitionLookup for Canned {
        fn lookup(&self, _: &Path, symbol: &str) -> Result<String> {
            if symbol == "Explodes" {
                return Err(Error::DefinitionLookup {
                    symbol: symbol.to_string(),
                    reason: "tool crashed".to_string(),
                });
            }
            Ok(self.0.to_string())
        }
    }

    fn resolver(response: &'static str) -> DefinitionResolver {
        DefinitionResolver::new("/proj", Arc::new(Canned(response)))
    }

    #[test]
    fn test_uses_first_candidate() -> Result<()> {
        let r = resolver(
            r#"[{"symbol_name":"User","definition_code":"class User {}"},
                {"definition_code":"class Other {}"}]"#,
        );
        assert_eq!(r.resolve("User")?, Some("class User {}".to_string()));
        Ok(())
    }

    #[test]
    fn test_empty_array_is_none() -> Result<()> {
        assert_eq!(resolver("[]\n").resolve("User")?, None);
        Ok(())
    }

    #[test]
    fn test_malformed_response_is_lookup_error() {
        for bad in ["not json", r#"{"definition_code":"x"}"#, r#"[{"signature":"x"}]"#] {
            let result = resolver(bad).resolve("User");
            assert!(
                matches!(result, Err(Error::DefinitionLookup { .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_tool_failure_propagates() {
        let result = resolver("[]").resolve("Explodes");
        assert!(matches!(result, Err(Error::DefinitionLookup { .. })));
    }
}
