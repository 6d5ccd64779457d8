// src/runner.rs

//! Wires configuration, collaborators and stages into the static-analysis flow.

use crate::analysis::GenerationSettings;
use crate::cancellation::CancellationToken;
use crate::config::Config;
use crate::core_types::ProjectInfo;
use crate::errors::Result;
use crate::extractor::{JavaParser, ToolchainRegistry};
use crate::flow::{Flow, SharedContext};
use crate::llm::{OpenAiBackend, TextGenerator};
use crate::progress::ProgressReporter;
use crate::prompt::TemplateStore;
use crate::session::{Session, SnapshotObserver};
use crate::stages::{
    ApiExtractionStage, ContextExtensionStage, ProjectAnalysisStage, PromptSource,
    SummaryGenerationStage, NEEDS_MORE_INFO,
};
use std::path::Path;
use std::sync::Arc;

/// What a finished run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    /// The context after the last stage.
    pub context: SharedContext,
    /// Action label the flow ended with.
    pub final_action: &'static str,
}

impl RunOutcome {
    pub fn session_dir(&self) -> Option<&Path> {
        self.context.session.as_ref().map(|s| s.dir.as_path())
    }
}

/// Runs the static-analysis flow for one configured project.
///
/// Collaborators default to the OpenAI-compatible backend and the Java
/// parser; both can be replaced, which is how the tests drive the pipeline.
pub struct PipelineRunner {
    config: Config,
    generator: Option<Arc<dyn TextGenerator>>,
    toolchains: Option<ToolchainRegistry>,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl PipelineRunner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            generator: None,
            toolchains: None,
            progress: None,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_toolchains(mut self, toolchains: ToolchainRegistry) -> Self {
        self.toolchains = Some(toolchains);
        self
    }

    pub fn with_progress(mut self, progress: Option<Arc<dyn ProgressReporter>>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn generator(&self) -> Result<Arc<dyn TextGenerator>> {
        let generator: Arc<dyn TextGenerator> = match &self.generator {
            Some(generator) => Arc::clone(generator),
            None => Arc::new(
                OpenAiBackend::new(self.config.llm.models.clone(), self.config.llm.timeout)?
                    .with_token_estimates(self.config.llm.log_token_estimates),
            ),
        };
        generator.validate_model(&self.config.llm.model)?;
        Ok(generator)
    }

    fn toolchains(&self) -> ToolchainRegistry {
        match &self.toolchains {
            Some(toolchains) => toolchains.clone(),
            None => {
                let parser = JavaParser::new(
                    self.config.parser.java_path.clone(),
                    self.config.parser.jar_path.clone(),
                )
                .with_env_fallback();
                ToolchainRegistry::new().register_adapter("Java", Arc::new(parser))
            }
        }
    }

    /// Builds the stage graph:
    ///
    /// `project_analysis -> api_extraction -> context_extension -> summary_generation`,
    /// with `summary_generation --needs_more_info--> context_extension`.
    ///
    /// # Errors
    /// Configuration errors from the backend (unknown model, missing
    /// credentials) and graph validation errors.
    pub fn build_flow(&self, token: &CancellationToken) -> Result<Flow> {
        let toolchains = self.toolchains();
        let templates = match &self.config.templates.dir {
            Some(dir) => TemplateStore::with_dir(dir),
            None => TemplateStore::builtin(),
        };
        let prompt = PromptSource {
            store: templates,
            name: self.config.templates.analysis.clone(),
            section: self.config.templates.section.clone(),
            mode: self.config.templates.substitution,
        };
        let settings = GenerationSettings {
            model: self.config.llm.model.clone(),
            temperature: self.config.llm.temperature,
            system_role: self.config.llm.system_role.clone(),
        };
        let analysis = ContextExtensionStage::new(
            toolchains.clone(),
            prompt,
            self.generator()?,
            settings,
            self.config.workers,
            token.clone(),
        )
        .with_progress(self.progress.clone());

        Flow::builder()
            .stage(ProjectAnalysisStage)
            .stage(ApiExtractionStage::new(toolchains))
            .stage(analysis)
            .stage(SummaryGenerationStage::new(self.config.refinement_rounds))
            .then("project_analysis", "api_extraction")
            .then("api_extraction", "context_extension")
            .then("context_extension", "summary_generation")
            .edge("summary_generation", NEEDS_MORE_INFO, "context_extension")
            .start("project_analysis")
            .max_iterations(self.config.max_iterations)
            .build()
    }

    /// Creates the session directory and the initial context for `command`.
    pub fn start_session(&self, command: &str) -> Result<SharedContext> {
        let session = Session::create(&self.config.session_root)?;
        session.write_info(&self.config.project_path, command, &self.config.llm.model)?;
        Ok(SharedContext::new(
            ProjectInfo::new(&self.config.project_path),
            Some(session),
        ))
    }

    /// Runs the flow on `ctx`. On error `ctx` keeps what finished stages produced.
    pub fn execute(&self, ctx: &mut SharedContext, token: &CancellationToken) -> Result<&'static str> {
        let flow = self.build_flow(token)?;
        log::debug!("Stage graph: {:?}", flow);
        flow.run(ctx, token, &SnapshotObserver)
    }

    /// Starts a session and runs the static-analysis flow in it.
    ///
    /// # Errors
    /// Any fatal error of the run. Use [`start_session`](Self::start_session)
    /// and [`execute`](Self::execute) to keep the context when a run fails.
    pub fn run(&self, command: &str, token: &CancellationToken) -> Result<RunOutcome> {
        let mut context = self.start_session(command)?;
        let final_action = self.execute(&mut context, token)?;
        log::info!("SA Analysis flow finished with action '{}'", final_action);
        Ok(RunOutcome {
            context,
            final_action,
        })
    }
}
