//! Contracts for the external source-code extractor, plus the adapters that
//! implement them.
//!
//! The pipeline never parses source code itself. It asks an [`ApiExtractor`]
//! to write endpoint records into the session directory, loads them with
//! [`records::load_extracted_apis`], and asks a [`DefinitionLookup`] for the
//! definition of individual symbols while building prompts.

pub mod definitions;
pub mod java;
pub mod records;

pub use definitions::{DefinitionCandidate, DefinitionResolver};
pub use java::JavaParser;
pub use records::load_extracted_apis;

use crate::errors::{Error, Result};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// What the extraction tool reported when it finished.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Process exit status; `0` means success.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExtractionReport {
    pub fn succeeded(&self) -> bool {
        self.status == 0
    }
}

/// Produces endpoint records for a project.
///
/// Implementations write `data/API/*.json` (one `{"apis": [...]}` document
/// per controller) and/or `api_extraction.json` (a bare array) under
/// `output_dir`.
pub trait ApiExtractor: Send + Sync {
    /// Checks that the tool can run at all (paths configured, etc).
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    fn extract(&self, project_root: &Path, output_dir: &Path) -> Result<ExtractionReport>;
}

/// Finds symbol definitions in a project.
pub trait DefinitionLookup: Send + Sync {
    /// Returns the raw JSON text of an array of candidate definitions.
    fn lookup(&self, project_root: &Path, symbol: &str) -> Result<String>;
}

/// The extractor and definition lookup used for one ecosystem.
#[derive(Clone)]
pub struct Toolchain {
    /// Matched against the `/`-separated parts of `ProjectInfo::project_type` (e.g. `Java`).
    pub language: String,
    pub extractor: Arc<dyn ApiExtractor>,
    pub definitions: Arc<dyn DefinitionLookup>,
}

impl fmt::Debug for Toolchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toolchain")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// The set of toolchains the pipeline can dispatch to.
#[derive(Clone, Debug, Default)]
pub struct ToolchainRegistry {
    toolchains: Vec<Toolchain>,
}

impl ToolchainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a toolchain. Earlier registrations win when several match.
    pub fn register(
        mut self,
        language: impl Into<String>,
        extractor: Arc<dyn ApiExtractor>,
        definitions: Arc<dyn DefinitionLookup>,
    ) -> Self {
        self.toolchains.push(Toolchain {
            language: language.into(),
            extractor,
            definitions,
        });
        self
    }

    /// Registers a single adapter that implements both contracts.
    pub fn register_adapter<T>(self, language: impl Into<String>, adapter: Arc<T>) -> Self
    where
        T: ApiExtractor + DefinitionLookup + 'static,
    {
        self.register(language, adapter.clone(), adapter)
    }

    /// Returns the toolchain for a detected project type.
    ///
    /// # Errors
    /// `Error::UnsupportedProjectType` if no registered language matches.
    pub fn for_project_type(&self, project_type: &str) -> Result<&Toolchain> {
        self.toolchains
            .iter()
            .find(|t| {
                project_type
                    .split(|c: char| c == '/' || c.is_whitespace())
                    .any(|part| part == t.language)
            })
            .ok_or_else(|| Error::UnsupportedProjectType(project_type.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    impl ApiExtractor for Nothing {
        fn extract(&self, _: &Path, _: &Path) -> Result<ExtractionReport> {
            Ok(ExtractionReport::default())
        }
    }

    impl DefinitionLookup for Nothing {
        fn lookup(&self, _: &Path, _: &str) -> Result<String> {
            Ok("[]".to_string())
        }
    }

    #[test]
    fn test_registry_matches_by_component() -> Result<()> {
        let registry = ToolchainRegistry::new().register_adapter("Java", Arc::new(Nothing));
        assert_eq!(registry.for_project_type("Java")?.language, "Java");
        assert!(registry.for_project_type("Java/Maven").is_ok());
        assert!(registry.for_project_type("JavaScript/TypeScript").is_err());
        Ok(())
    }

    #[test]
    fn test_registry_rejects_unknown_types() {
        let registry = ToolchainRegistry::new().register_adapter("Java", Arc::new(Nothing));
        let result = registry.for_project_type("Python");
        assert!(matches!(result, Err(Error::UnsupportedProjectType(t)) if t == "Python"));
    }

    #[test]
    fn test_report_success_flag() {
        assert!(ExtractionReport::default().succeeded());
        let failed = ExtractionReport {
            status: 2,
            ..Default::default()
        };
        assert!(!failed.succeeded());
    }
}
