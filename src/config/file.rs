// src/config/file.rs

//! The optional JSON configuration file.
//!
//! ```json
//! {
//!   "output": "runs",
//!   "workers": 8,
//!   "templates": { "dir": "prompts", "substitution": "sequential" },
//!   "llm": {
//!     "model": "deepseek-r1",
//!     "timeout_secs": 300,
//!     "models": [
//!       { "name": "local", "model": "llama3", "base_url": "http://localhost:11434/v1" }
//!     ]
//!   },
//!   "parser": { "java_path": "/usr/bin/java", "jar_path": "tools/java_parser.jar" }
//! }
//! ```

use crate::errors::{io_error_with_path, json_error, Result};
use crate::llm::ModelSpec;
use crate::prompt::SubstitutionMode;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Every field is optional; missing values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub max_iterations: Option<usize>,
    pub refinement_rounds: Option<u32>,
    pub verbose: Option<bool>,
    pub templates: TemplatesSection,
    pub llm: LlmSection,
    pub parser: ParserSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatesSection {
    pub dir: Option<PathBuf>,
    pub analysis: Option<String>,
    pub section: Option<String>,
    pub substitution: Option<SubstitutionMode>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub system_role: Option<String>,
    pub timeout_secs: Option<u64>,
    pub log_token_estimates: Option<bool>,
    /// Added to, or replacing by name, the built-in model table.
    pub models: Vec<ModelSpec>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ParserSection {
    pub java_path: Option<PathBuf>,
    pub jar_path: Option<PathBuf>,
}

impl FileConfig {
    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// `Error::Io` if the file cannot be read, `Error::Json` if it is not a
    /// valid configuration document.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| io_error_with_path(e, path))?;
        let config: FileConfig = serde_json::from_str(&text)
            .map_err(|e| json_error(e, format!("config file {}", path.display())))?;
        log::debug!("Loaded configuration file {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use tempfile::tempdir;

    #[test]
    fn test_load_nested_sections() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("wfg.json");
        fs::write(
            &path,
            r#"{
                "workers": 8,
                "templates": {"substitution": "sequential"},
                "llm": {"model": "local", "models": [
                    {"name": "local", "model": "llama3", "base_url": "http://localhost:11434/v1"}
                ]},
                "parser": {"jar_path": "parser.jar"}
            }"#,
        )?;
        let config = FileConfig::load(&path)?;
        assert_eq!(config.workers, Some(8));
        assert_eq!(config.templates.substitution, Some(SubstitutionMode::Sequential));
        assert_eq!(config.llm.models[0].name, "local");
        assert_eq!(config.parser.jar_path, Some(PathBuf::from("parser.jar")));
        assert!(config.output.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_object_is_all_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("empty.json");
        fs::write(&path, "{}")?;
        assert_eq!(FileConfig::load(&path)?, FileConfig::default());
        Ok(())
    }

    #[test]
    fn test_unknown_keys_are_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("typo.json");
        fs::write(&path, r#"{"wrokers": 2}"#)?;
        assert!(matches!(FileConfig::load(&path), Err(Error::Json { .. })));
        Ok(())
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = FileConfig::load(Path::new("/no/such/wfg.json"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
