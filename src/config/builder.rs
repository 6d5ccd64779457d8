// src/config/builder.rs

use super::{
    path_resolve::resolve_project_path, validation::validate_config, Config, FileConfig,
    LlmConfig, ParserConfig, TemplateConfig,
};
use crate::cli::Cli;
use crate::constants::{
    ANALYSIS_TEMPLATE, DEFAULT_LLM_TIMEOUT_SECS, DEFAULT_MAX_ITERATIONS, DEFAULT_MODEL,
    DEFAULT_REFINEMENT_ROUNDS, DEFAULT_SESSION_ROOT, DEFAULT_SYSTEM_ROLE, DEFAULT_TEMPERATURE,
    DEFAULT_WORKERS,
};
use crate::errors::{Error, Result};
use crate::llm::ModelRegistry;
use crate::prompt::SubstitutionMode;
use std::path::PathBuf;
use std::time::Duration;

/// Builds a [`Config`] from explicit settings, an optional config file and defaults.
///
/// Explicit settings win over the file, the file wins over defaults.
///
/// # Examples
///
/// ```
/// use wfg::ConfigBuilder;
///
/// let dir = tempfile::tempdir().unwrap();
/// let config = ConfigBuilder::new()
///     .project_path(dir.path().to_string_lossy())
///     .workers(2)
///     .model("deepseek-r1")
///     .build()
///     .unwrap();
/// assert_eq!(config.workers, 2);
/// assert_eq!(config.llm.model, "deepseek-r1");
/// assert_eq!(config.max_iterations, 32);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    project_path: Option<String>,
    session_root: Option<PathBuf>,
    config_file: Option<PathBuf>,
    workers: Option<usize>,
    max_iterations: Option<usize>,
    refinement_rounds: Option<u32>,
    template_dir: Option<PathBuf>,
    analysis_template: Option<String>,
    template_section: Option<String>,
    substitution: Option<SubstitutionMode>,
    model: Option<String>,
    temperature: Option<f32>,
    system_role: Option<String>,
    timeout_secs: Option<u64>,
    java_path: Option<PathBuf>,
    jar_path: Option<PathBuf>,
    verbose: Option<bool>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from parsed command-line arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            project_path: Some(cli.project.clone()),
            session_root: cli.output.as_ref().map(PathBuf::from),
            config_file: cli.config.as_ref().map(PathBuf::from),
            workers: cli.workers,
            model: cli.model.clone(),
            template_dir: cli.templates.as_ref().map(PathBuf::from),
            // A flag that is absent must not override the file.
            verbose: cli.verbose.then_some(true),
            ..Self::default()
        }
    }

    pub fn project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    pub fn session_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.session_root = Some(dir.into());
        self
    }

    pub fn config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn refinement_rounds(mut self, rounds: u32) -> Self {
        self.refinement_rounds = Some(rounds);
        self
    }

    pub fn template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(dir.into());
        self
    }

    pub fn analysis_template(mut self, name: impl Into<String>) -> Self {
        self.analysis_template = Some(name.into());
        self
    }

    pub fn template_section(mut self, key: impl Into<String>) -> Self {
        self.template_section = Some(key.into());
        self
    }

    pub fn substitution(mut self, mode: SubstitutionMode) -> Self {
        self.substitution = Some(mode);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn system_role(mut self, role: impl Into<String>) -> Self {
        self.system_role = Some(role.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn java_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.java_path = Some(path.into());
        self
    }

    pub fn jar_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.jar_path = Some(path.into());
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Merges all layers and validates the result.
    ///
    /// # Errors
    /// `Error::Config` for a missing or invalid project path and out-of-range
    /// values, `Error::UnknownModel` for an unknown model selector, and
    /// `Error::Io`/`Error::Json` when the config file cannot be loaded.
    pub fn build(self) -> Result<Config> {
        let file = match &self.config_file {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let project = self
            .project_path
            .as_deref()
            .ok_or_else(|| Error::Config("project path is required".to_string()))?;
        let project_path = resolve_project_path(project)?;

        let mut models = ModelRegistry::default();
        for spec in file.llm.models {
            models.upsert(spec);
        }

        let config = Config {
            project_path,
            session_root: self
                .session_root
                .or(file.output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_ROOT)),
            workers: self.workers.or(file.workers).unwrap_or(DEFAULT_WORKERS),
            max_iterations: self
                .max_iterations
                .or(file.max_iterations)
                .unwrap_or(DEFAULT_MAX_ITERATIONS),
            refinement_rounds: self
                .refinement_rounds
                .or(file.refinement_rounds)
                .unwrap_or(DEFAULT_REFINEMENT_ROUNDS),
            templates: TemplateConfig {
                dir: self.template_dir.or(file.templates.dir),
                analysis: self
                    .analysis_template
                    .or(file.templates.analysis)
                    .unwrap_or_else(|| ANALYSIS_TEMPLATE.to_string()),
                section: self.template_section.or(file.templates.section),
                substitution: self
                    .substitution
                    .or(file.templates.substitution)
                    .unwrap_or_default(),
            },
            llm: LlmConfig {
                model: self
                    .model
                    .or(file.llm.model)
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature: self
                    .temperature
                    .or(file.llm.temperature)
                    .unwrap_or(DEFAULT_TEMPERATURE),
                system_role: self
                    .system_role
                    .or(file.llm.system_role)
                    .unwrap_or_else(|| DEFAULT_SYSTEM_ROLE.to_string()),
                timeout: Duration::from_secs(
                    self.timeout_secs
                        .or(file.llm.timeout_secs)
                        .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
                ),
                models,
                log_token_estimates: file.llm.log_token_estimates.unwrap_or(false),
            },
            parser: ParserConfig {
                java_path: self.java_path.or(file.parser.java_path),
                jar_path: self.jar_path.or(file.parser.jar_path),
            },
            verbose: self.verbose.or(file.verbose).unwrap_or(false),
        };

        validate_config(&config)?;
        log::debug!("Configuration built: {:?}", config);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let config = ConfigBuilder::new()
            .project_path(dir.path().to_string_lossy())
            .build()?;
        assert!(config.project_path.is_absolute());
        assert_eq!(config.session_root, PathBuf::from("logs"));
        assert_eq!(config.workers, 4);
        assert_eq!(config.refinement_rounds, 1);
        assert_eq!(config.llm.model, "qwen");
        assert_eq!(config.llm.timeout, Duration::from_secs(120));
        assert_eq!(config.templates.analysis, "SA/api_analysis.json");
        assert_eq!(config.templates.substitution, SubstitutionMode::SinglePass);
        assert!(!config.verbose);
        Ok(())
    }

    #[test]
    fn test_cli_overrides_file_overrides_defaults() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("wfg.json");
        fs::write(
            &file,
            r#"{"workers": 8, "output": "runs", "verbose": true,
                "llm": {"model": "deepseek", "temperature": 0.7}}"#,
        )?;
        let project = dir.path().to_string_lossy().to_string();
        let file_arg = file.to_string_lossy().to_string();
        let cli = Cli::parse_from(["wfg", "-p", &project, "-c", &file_arg, "-j", "2"]);

        let config = ConfigBuilder::from_cli(&cli).build()?;
        assert_eq!(config.workers, 2);
        assert_eq!(config.session_root, PathBuf::from("runs"));
        assert_eq!(config.llm.model, "deepseek");
        assert!((config.llm.temperature - 0.7).abs() < f32::EPSILON);
        // -v was not given, so the file's value stands.
        assert!(config.verbose);
        Ok(())
    }

    #[test]
    fn test_file_models_extend_the_table() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let file = dir.path().join("wfg.json");
        fs::write(
            &file,
            r#"{"llm": {"model": "llama-local", "models": [
                {"name": "llama", "model": "llama3", "base_url": "http://localhost:11434/v1"}]}}"#,
        )?;
        let config = ConfigBuilder::new()
            .project_path(dir.path().to_string_lossy())
            .config_file(&file)
            .build()?;
        assert_eq!(config.llm.models.resolve("llama-local")?.model, "llama3");
        assert!(config.llm.models.resolve("qwen").is_ok());
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let base = || ConfigBuilder::new().project_path(dir.path().to_string_lossy());

        assert!(matches!(base().workers(0).build(), Err(Error::Config(_))));
        assert!(matches!(base().max_iterations(0).build(), Err(Error::Config(_))));
        assert!(matches!(base().temperature(3.5).build(), Err(Error::Config(_))));
        assert!(matches!(base().timeout_secs(0).build(), Err(Error::Config(_))));
        assert!(matches!(
            base().model("gpt-mystery").build(),
            Err(Error::UnknownModel(_))
        ));
        assert!(matches!(ConfigBuilder::new().build(), Err(Error::Config(_))));
        Ok(())
    }
}
