// tests/common.rs

#![allow(dead_code)] // Each integration test binary uses a different subset.

use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use wfg::extractor::{ApiExtractor, DefinitionLookup, ExtractionReport, ToolchainRegistry};
use wfg::llm::{GenerationRequest, TextGenerator};

// Helper function to get the binary command
pub fn wfg_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("wfg"))
}

/// Writes a Maven project whose `UserController.java` has one handler per
/// line: `void handler0() {}`, `void handler1() {}`, ...
pub fn java_project(root: &Path, handlers: usize) -> anyhow::Result<()> {
    fs::write(root.join("pom.xml"), "<project/>")?;
    let dir = root.join("src/main/java");
    fs::create_dir_all(&dir)?;
    let source: String = (0..handlers)
        .map(|i| format!("void handler{i}() {{}}\n"))
        .collect();
    fs::write(dir.join("UserController.java"), source)?;
    Ok(())
}

/// Endpoint records matching [`java_project`].
pub fn endpoint_records(handlers: usize) -> String {
    let apis: Vec<serde_json::Value> = (0..handlers)
        .map(|i| {
            serde_json::json!({
                "controller_name": "UserController",
                "method_name": format!("handler{i}"),
                "code_pos": format!("src/main/java/UserController.java:L{i}-L{}", i + 1),
                "http_method": "GET",
                "req": {
                    "method": "GET",
                    "path": format!("/users/{i}"),
                    "query_params": {"filter": "UserFilter"}
                },
                "references": ["UserService"]
            })
        })
        .collect();
    serde_json::json!({"controller_name": "UserController", "apis": apis}).to_string()
}

/// An extractor that writes a fixed record file, and resolves every symbol
/// to a one-line class.
pub struct FakeParser {
    pub records: String,
}

impl ApiExtractor for FakeParser {
    fn extract(&self, _root: &Path, output_dir: &Path) -> wfg::Result<ExtractionReport> {
        let path = output_dir.join("data/API/UserController.json");
        fs::write(&path, &self.records).map_err(|e| wfg::errors::io_error_with_path(e, &path))?;
        Ok(ExtractionReport::default())
    }
}

impl DefinitionLookup for FakeParser {
    fn lookup(&self, _root: &Path, symbol: &str) -> wfg::Result<String> {
        Ok(serde_json::json!([{ "definition_code": format!("class {symbol} {{}}") }]).to_string())
    }
}

pub fn fake_toolchains(handlers: usize) -> ToolchainRegistry {
    fake_toolchains_with(endpoint_records(handlers))
}

pub fn fake_toolchains_with(records: String) -> ToolchainRegistry {
    ToolchainRegistry::new().register_adapter("Java", Arc::new(FakeParser { records }))
}

type Reply = dyn Fn(&str, usize) -> wfg::Result<String> + Send + Sync;

/// A generator that answers with `reply(prompt, call_number)` and counts calls.
pub struct ScriptedModel {
    reply: Box<Reply>,
    pub calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new<F>(reply: F) -> Arc<Self>
    where
        F: Fn(&str, usize) -> wfg::Result<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn approving() -> Arc<Self> {
        Self::new(|_, _| Ok("```json\n{\"status\": \"success\"}\n```".to_string()))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for ScriptedModel {
    fn generate(&self, request: &GenerationRequest<'_>) -> wfg::Result<String> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.reply)(request.prompt, call)
    }
}
