// src/analysis/endpoint.rs

//! Analysis of a single endpoint: gather definitions, slice the handler,
//! render the prompt, ask the model.

use super::stats::classify_status;
use crate::core_types::{AnalysisResult, ApiInfo};
use crate::errors::Result;
use crate::extractor::DefinitionResolver;
use crate::llm::{GenerationRequest, TextGenerator};
use crate::prompt::{PromptBuilder, PromptParams};
use crate::session::LlmCallLog;
use crate::slicer::slice_code;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Model parameters for every call made by one analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    /// Used when the template has no `system_prompt`.
    pub system_role: String,
}

/// Symbols whose definitions give the model useful context for `api`:
/// its references, the request body type and every query parameter type,
/// deduplicated in first-seen order.
pub fn collect_symbols(api: &ApiInfo) -> Vec<String> {
    let body_type = api.req.body.get("type").and_then(Value::as_str);
    let candidates = api
        .references
        .iter()
        .map(String::as_str)
        .chain(body_type)
        .chain(api.req.query_params.values().map(String::as_str));

    let mut seen = HashSet::new();
    candidates
        .filter(|s| !s.trim().is_empty())
        .filter(|s| seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Analyzes endpoints of one project. Shared read-only by all workers.
pub struct EndpointAnalyzer {
    project_root: PathBuf,
    project_type: String,
    resolver: DefinitionResolver,
    prompt: PromptBuilder,
    generator: Arc<dyn TextGenerator>,
    settings: GenerationSettings,
    call_log: Option<Arc<LlmCallLog>>,
}

impl EndpointAnalyzer {
    pub fn new(
        project_root: impl Into<PathBuf>,
        project_type: impl Into<String>,
        resolver: DefinitionResolver,
        prompt: PromptBuilder,
        generator: Arc<dyn TextGenerator>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            project_type: project_type.into(),
            resolver,
            prompt,
            generator,
            settings,
            call_log: None,
        }
    }

    /// Records every prompt/response pair in `log`.
    pub fn with_call_log(mut self, log: Arc<LlmCallLog>) -> Self {
        self.call_log = Some(log);
        self
    }

    /// Concatenated definition snippets for `symbols`. Failed lookups are
    /// logged and skipped.
    pub fn definition_context(&self, symbols: &[String]) -> String {
        let mut context = String::new();
        for symbol in symbols {
            match self.resolver.resolve(symbol) {
                Ok(Some(code)) => {
                    context.push_str("// Definition for ");
                    context.push_str(symbol);
                    context.push('\n');
                    context.push_str(&code);
                    context.push('\n');
                }
                Ok(None) => log::debug!("No definition found for {}", symbol),
                Err(e) => log::warn!("Skipping definition of {}: {}", symbol, e),
            }
        }
        context
    }

    /// Renders the prompt for `api` without calling the model.
    pub fn build_prompt(&self, api: &ApiInfo) -> Result<String> {
        let function = slice_code(&self.project_root, &api.code_pos)?;
        let context_info = self.definition_context(&collect_symbols(api));

        let mut params = PromptParams::new();
        params
            .set("PROJECT_TYPE", &self.project_type)
            .set("HTTP_METHOD", http_method(api))
            .set("SRC_NAME", &api.req.path)
            .set("SRC_LINE", &api.code_pos)
            .set("FUNCTION", function)
            .set("CONTEXT_INFO", context_info);
        Ok(self.prompt.build(&params))
    }

    /// Analyzes the endpoint at position `index` of the context's API list.
    ///
    /// # Errors
    /// Slice errors and backend errors. Definition lookup failures are not
    /// errors; they only shrink the context.
    pub fn analyze(&self, index: usize, api: &ApiInfo) -> Result<AnalysisResult> {
        let span = tracing::info_span!("analyze_api", index, api = %api.label());
        let _guard = span.enter();

        let prompt = self.build_prompt(api)?;
        let system_role = self
            .prompt
            .system_prompt()
            .unwrap_or(&self.settings.system_role);

        let analysis = self.generator.generate(&GenerationRequest {
            prompt: &prompt,
            model: &self.settings.model,
            temperature: self.settings.temperature,
            system_role,
        })?;

        if let Some(call_log) = &self.call_log {
            if let Err(e) = call_log.record(api, system_role, &prompt, &analysis) {
                log::warn!("Could not write LLM log for {}: {}", api.label(), e);
            }
        }

        let status = classify_status(&analysis);
        tracing::debug!(%status, "analysis received");
        Ok(AnalysisResult {
            index,
            api_info: api.clone(),
            analysis,
            status,
        })
    }
}

/// The declared HTTP method, falling back to the request's method.
fn http_method(api: &ApiInfo) -> &str {
    if api.http_method.is_empty() {
        &api.req.method
    } else {
        &api.http_method
    }
}
