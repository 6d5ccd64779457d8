//! Defines the `Config` struct the pipeline runs with.
//!
//! Values come from three layers: built-in defaults, an optional JSON
//! configuration file, and command-line flags. [`ConfigBuilder`] merges them
//! with the command line winning.

use crate::llm::ModelRegistry;
use crate::prompt::SubstitutionMode;
use std::path::PathBuf;
use std::time::Duration;

pub use builder::ConfigBuilder;
pub use file::FileConfig;
mod builder;
mod file;
mod path_resolve;
mod validation;

/// Text-generation settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model selector passed with every request.
    pub model: String,
    pub temperature: f32,
    /// Persona used when the template has no `system_prompt`.
    pub system_role: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Known models and how to reach them.
    pub models: ModelRegistry,
    /// Log a rough token count per call.
    pub log_token_estimates: bool,
}

/// Locations of the Java parser. Unset values fall back to the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserConfig {
    pub java_path: Option<PathBuf>,
    pub jar_path: Option<PathBuf>,
}

/// Prompt template selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    /// Searched before the built-in templates.
    pub dir: Option<PathBuf>,
    /// Template used for endpoint analysis, e.g. `SA/api_analysis.json`.
    pub analysis: String,
    /// Top-level key of the template to use; `None` uses the whole document.
    pub section: Option<String>,
    pub substitution: SubstitutionMode,
}

/// Holds the validated configuration for a run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Canonical path of the project under analysis.
    pub project_path: PathBuf,
    /// Parent directory of session directories.
    pub session_root: PathBuf,
    /// Size of the analysis worker pool (at least 1).
    pub workers: usize,
    /// Cap on stage executions per run.
    pub max_iterations: usize,
    /// How many extra analysis rounds the summary may request.
    pub refinement_rounds: u32,
    pub templates: TemplateConfig,
    pub llm: LlmConfig,
    pub parser: ParserConfig,
    /// Debug logging, including the detailed session log file.
    pub verbose: bool,
}
