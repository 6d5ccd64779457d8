// src/stages/context_extension.rs

//! The concurrent analysis stage.
//!
//! Every endpoint without a result is analyzed on a dedicated worker pool.
//! Failures (errors or panics) of single endpoints are logged and the
//! endpoint is left out; the other endpoints are unaffected. On re-entry
//! only endpoints still missing a result are submitted.

use crate::analysis::stats::compute_stats;
use crate::analysis::{EndpointAnalyzer, GenerationSettings};
use crate::cancellation::CancellationToken;
use crate::core_types::{AnalysisResult, ApiInfo};
use crate::errors::{Error, Result};
use crate::extractor::{DefinitionResolver, ToolchainRegistry};
use crate::flow::{ContextPatch, DefaultAction, SharedContext, Stage, StageOutcome};
use crate::llm::TextGenerator;
use crate::progress::ProgressReporter;
use crate::prompt::{PromptBuilder, SubstitutionMode, TemplateSection, TemplateStore};
use crossbeam_channel::unbounded;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Where the analysis prompt comes from.
#[derive(Debug, Clone)]
pub struct PromptSource {
    pub store: TemplateStore,
    pub name: String,
    /// Top-level key to use; `None` for the whole document.
    pub section: Option<String>,
    pub mode: SubstitutionMode,
}

impl PromptSource {
    fn load(&self) -> Result<PromptBuilder> {
        let section = match &self.section {
            Some(key) => TemplateSection::Key(key),
            None => TemplateSection::Whole,
        };
        Ok(PromptBuilder::load(&self.store, &self.name, section)?.with_mode(self.mode))
    }
}

/// Fans [`EndpointAnalyzer`] out over all pending endpoints.
pub struct ContextExtensionStage {
    toolchains: ToolchainRegistry,
    prompt: PromptSource,
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
    workers: usize,
    token: CancellationToken,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl ContextExtensionStage {
    pub fn new(
        toolchains: ToolchainRegistry,
        prompt: PromptSource,
        generator: Arc<dyn TextGenerator>,
        settings: GenerationSettings,
        workers: usize,
        token: CancellationToken,
    ) -> Self {
        Self {
            toolchains,
            prompt,
            generator,
            settings,
            workers,
            token,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<Arc<dyn ProgressReporter>>) -> Self {
        self.progress = progress;
        self
    }

    /// Analyzes `work` on a pool of `self.workers` threads and returns the
    /// successful results in completion order.
    fn analyze_all(
        &self,
        analyzer: &EndpointAnalyzer,
        work: &[(usize, ApiInfo)],
    ) -> Result<Vec<AnalysisResult>> {
        if work.is_empty() {
            return Ok(Vec::new());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("wfg-analysis-{i}"))
            .build()
            .map_err(|e| Error::Config(format!("cannot start worker pool: {e}")))?;

        if let Some(progress) = &self.progress {
            progress.start(work.len() as u64, "Analyzing APIs");
        }

        let (tx, rx) = unbounded::<(usize, String, TaskOutcome)>();
        let mut results = Vec::with_capacity(work.len());
        let mut failed = 0usize;
        let mut skipped = 0usize;

        pool.in_place_scope(|scope| {
            for (index, api) in work {
                let tx = tx.clone();
                let token = &self.token;
                scope.spawn(move |_| {
                    let outcome = if token.is_cancelled() {
                        TaskOutcome::Skipped
                    } else {
                        match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(*index, api))) {
                            Ok(result) => TaskOutcome::Finished(result),
                            Err(payload) => TaskOutcome::Panicked(panic_message(payload.as_ref())),
                        }
                    };
                    // The receiver outlives the scope, so sending cannot fail.
                    let _ = tx.send((*index, api.label(), outcome));
                });
            }
            drop(tx);

            for (index, label, outcome) in rx.iter() {
                match outcome {
                    TaskOutcome::Finished(Ok(result)) => {
                        log::info!("Analyzed API {} ({}): {}", index, label, result.status);
                        results.push(result);
                    }
                    TaskOutcome::Finished(Err(e)) => {
                        failed += 1;
                        log::error!("Analysis of API {} ({}) failed: {}", index, label, e);
                    }
                    TaskOutcome::Panicked(msg) => {
                        failed += 1;
                        log::error!("Analysis of API {} ({}) panicked: {}", index, label, msg);
                    }
                    TaskOutcome::Skipped => skipped += 1,
                }
                if let Some(progress) = &self.progress {
                    progress.advance(&label);
                }
            }
        });

        if skipped > 0 {
            log::warn!("Cancelled: {} APIs were not analyzed", skipped);
        }
        if let Some(progress) = &self.progress {
            progress.finish(format!("{} analyzed, {} failed", results.len(), failed));
        }
        Ok(results)
    }
}

enum TaskOutcome {
    Finished(Result<AnalysisResult>),
    Panicked(String),
    Skipped,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

pub struct AnalysisBatch {
    analyzer: EndpointAnalyzer,
    work: Vec<(usize, ApiInfo)>,
}

impl Stage for ContextExtensionStage {
    type Prepared = AnalysisBatch;
    type Output = Vec<AnalysisResult>;
    type Action = DefaultAction;

    fn name(&self) -> &'static str {
        "context_extension"
    }

    fn prepare(&self, ctx: &SharedContext) -> Result<AnalysisBatch> {
        let info = ctx
            .project_info
            .as_ref()
            .ok_or_else(|| Error::Config("no project info in context".to_string()))?;
        for api in &ctx.apis {
            api.validate()?;
        }

        let toolchain = self.toolchains.for_project_type(&info.project_type)?;
        let mut analyzer = EndpointAnalyzer::new(
            &info.root_path,
            &info.project_type,
            DefinitionResolver::new(&info.root_path, Arc::clone(&toolchain.definitions)),
            self.prompt.load()?,
            Arc::clone(&self.generator),
            self.settings.clone(),
        );
        if let Some(session) = &ctx.session {
            analyzer = analyzer.with_call_log(session.llm_log());
        }

        let work: Vec<(usize, ApiInfo)> = ctx
            .pending_indices()
            .into_iter()
            .map(|i| (i, ctx.apis[i].clone()))
            .collect();
        log::info!(
            "Analyzing {} of {} APIs with {} workers",
            work.len(),
            ctx.apis.len(),
            self.workers
        );
        Ok(AnalysisBatch { analyzer, work })
    }

    fn execute(&self, batch: &AnalysisBatch) -> Result<Vec<AnalysisResult>> {
        self.analyze_all(&batch.analyzer, &batch.work)
    }

    fn finalize(
        &self,
        ctx: &SharedContext,
        _batch: AnalysisBatch,
        results: Vec<AnalysisResult>,
    ) -> Result<StageOutcome<DefaultAction>> {
        let stats = compute_stats(
            ctx.analysis_results
                .iter()
                .chain(results.iter())
                .map(|r| r.analysis.as_str()),
        );
        match stats.success_rate {
            Some(rate) => log::info!(
                "Analysis success rate: {:.2}% ({}/{} parsed, {} collected)",
                rate,
                stats.successes,
                stats.parsed,
                stats.total_collected
            ),
            None => log::warn!(
                "No parseable analysis results among {} collected",
                stats.total_collected
            ),
        }
        Ok(StageOutcome::new(
            ContextPatch::new().results(results).stats(stats),
            DefaultAction::Default,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{AnalysisStatus, HttpRequest, ProjectInfo};
    use crate::extractor::{ApiExtractor, DefinitionLookup, ExtractionReport};
    use crate::llm::GenerationRequest;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::{tempdir, TempDir};

    struct NoTool;

    impl ApiExtractor for NoTool {
        fn extract(&self, _: &Path, _: &Path) -> Result<ExtractionReport> {
            Ok(ExtractionReport::default())
        }
    }

    impl DefinitionLookup for NoTool {
        fn lookup(&self, _: &Path, _: &str) -> Result<String> {
            Ok("[]".to_string())
        }
    }

    /// Echoes the prompt back inside a success verdict, fails for prompts
    /// containing "fail", panics for prompts containing "panic".
    struct Echo {
        calls: Mutex<usize>,
    }

    impl TextGenerator for Echo {
        fn generate(&self, request: &GenerationRequest<'_>) -> Result<String> {
            *self.calls.lock().unwrap() += 1;
            if request.prompt.contains("panic") {
                panic!("backend exploded");
            }
            if request.prompt.contains("fail") {
                return Err(Error::Llm("HTTP 500".to_string()));
            }
            Ok(format!(
                "```json\n{{\"status\":\"success\",\"echo\":{}}}\n```",
                serde_json::Value::from(request.prompt)
            ))
        }
    }

    fn project(bodies: &[&str]) -> anyhow::Result<(TempDir, SharedContext)> {
        let dir = tempdir()?;
        fs::write(dir.path().join("echo.json"), r#"["<FUNCTION>"]"#)?;
        let mut apis = Vec::new();
        for (i, body) in bodies.iter().enumerate() {
            let file = format!("Api{i}.java");
            fs::write(dir.path().join(&file), format!("{body}\n"))?;
            apis.push(ApiInfo {
                controller_name: format!("C{i}"),
                method_name: "m".to_string(),
                code_pos: format!("{file}:L0-L1"),
                req: HttpRequest {
                    method: "GET".to_string(),
                    path: format!("/api/{i}"),
                    ..HttpRequest::default()
                },
                ..ApiInfo::default()
            });
        }
        let mut info = ProjectInfo::new(dir.path());
        info.project_type = "Java".to_string();
        let mut ctx = SharedContext::new(info, None);
        ctx.apis = apis;
        Ok((dir, ctx))
    }

    fn stage(
        root: &Path,
        generator: Arc<Echo>,
        workers: usize,
        token: CancellationToken,
    ) -> ContextExtensionStage {
        ContextExtensionStage::new(
            ToolchainRegistry::new().register_adapter("Java", Arc::new(NoTool)),
            PromptSource {
                store: TemplateStore::with_dir(root),
                name: "echo.json".to_string(),
                section: None,
                mode: SubstitutionMode::SinglePass,
            },
            generator,
            GenerationSettings {
                model: "qwen".to_string(),
                temperature: 0.0,
                system_role: "role".to_string(),
            },
            workers,
            token,
        )
    }

    fn run(stage: &ContextExtensionStage, ctx: &mut SharedContext) -> Result<()> {
        let batch = stage.prepare(ctx)?;
        let results = stage.execute(&batch)?;
        let outcome = stage.finalize(ctx, batch, results)?;
        ctx.apply(outcome.patch);
        Ok(())
    }

    #[test]
    fn test_every_item_gets_a_distinct_result() -> anyhow::Result<()> {
        let bodies: Vec<String> = (0..12).map(|i| format!("body {i}")).collect();
        let refs: Vec<&str> = bodies.iter().map(String::as_str).collect();
        let (dir, mut ctx) = project(&refs)?;
        let generator = Arc::new(Echo { calls: Mutex::new(0) });
        run(&stage(dir.path(), generator.clone(), 4, CancellationToken::new()), &mut ctx)?;

        assert_eq!(ctx.analysis_results.len(), 12);
        for (i, result) in ctx.analysis_results.iter().enumerate() {
            assert_eq!(result.index, i);
            assert_eq!(result.api_info, ctx.apis[i]);
            assert!(result.analysis.contains(&format!("body {i}")));
            assert_eq!(result.status, AnalysisStatus::Success);
        }
        assert_eq!(*generator.calls.lock().unwrap(), 12);
        let stats = ctx.analysis_stats.unwrap();
        assert_eq!(stats.success_rate, Some(100.0));
        Ok(())
    }

    #[test]
    fn test_failures_and_panics_are_isolated() -> anyhow::Result<()> {
        let (dir, mut ctx) = project(&["ok 0", "fail 1", "ok 2", "panic 3", "ok 4"])?;
        let generator = Arc::new(Echo { calls: Mutex::new(0) });
        run(&stage(dir.path(), generator, 2, CancellationToken::new()), &mut ctx)?;

        let indices: Vec<_> = ctx.analysis_results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 2, 4]);
        assert_eq!(ctx.pending_indices(), vec![1, 3]);
        Ok(())
    }

    #[test]
    fn test_reentry_only_analyzes_missing() -> anyhow::Result<()> {
        let (dir, mut ctx) = project(&["a", "b", "c"])?;
        ctx.analysis_results
            .push(AnalysisResult::pending(1, ctx.apis[1].clone()));
        let generator = Arc::new(Echo { calls: Mutex::new(0) });
        run(&stage(dir.path(), generator.clone(), 4, CancellationToken::new()), &mut ctx)?;

        assert_eq!(*generator.calls.lock().unwrap(), 2);
        assert_eq!(ctx.analysis_results.len(), 3);
        // The pre-existing result has no parseable text.
        let stats = ctx.analysis_stats.unwrap();
        assert_eq!((stats.total_collected, stats.parsed), (3, 2));
        Ok(())
    }

    #[test]
    fn test_cancelled_run_skips_work() -> anyhow::Result<()> {
        let (dir, mut ctx) = project(&["a", "b"])?;
        let token = CancellationToken::new();
        token.cancel();
        let generator = Arc::new(Echo { calls: Mutex::new(0) });
        run(&stage(dir.path(), generator.clone(), 2, token), &mut ctx)?;
        assert!(ctx.analysis_results.is_empty());
        assert_eq!(*generator.calls.lock().unwrap(), 0);
        Ok(())
    }

    #[test]
    fn test_malformed_code_pos_is_fatal() -> anyhow::Result<()> {
        let (dir, mut ctx) = project(&["a"])?;
        ctx.apis[0].code_pos = "Api0.java:0-1".to_string();
        let generator = Arc::new(Echo { calls: Mutex::new(0) });
        let result = run(&stage(dir.path(), generator, 2, CancellationToken::new()), &mut ctx);
        assert!(matches!(result, Err(Error::SliceFormat { .. })));
        Ok(())
    }
}
