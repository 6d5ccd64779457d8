//! `wfg` is a library and command-line tool that runs an LLM-assisted static
//! analysis over every HTTP endpoint of a web project.
//!
//! The static-analysis flow is a small graph of stages sharing one context:
//! 1.  **Project analysis**: detect the project type and list source files.
//! 2.  **API extraction**: run the external extractor and load its endpoint records.
//! 3.  **Context extension**: for every endpoint, gather symbol definitions,
//!     slice the handler source, render a prompt and ask the model. Endpoints
//!     are analyzed concurrently and a failing one never affects the others.
//! 4.  **Summary generation**: aggregate results, and loop back to step 3 once
//!     if some endpoints are still missing a result.
//!
//! Each run writes into its own session directory.
//!
//! # Example: Library Usage
//!
//! The extractor and the model are pluggable. This example drives the
//! whole flow with in-process stand-ins.
//!
//! ```
//! use wfg::extractor::{ApiExtractor, DefinitionLookup, ExtractionReport, ToolchainRegistry};
//! use wfg::llm::{GenerationRequest, TextGenerator};
//! use wfg::{CancellationToken, ConfigBuilder, PipelineRunner};
//! use std::fs;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct OneEndpoint;
//!
//! impl ApiExtractor for OneEndpoint {
//!     fn extract(&self, _root: &Path, out: &Path) -> wfg::Result<ExtractionReport> {
//!         let record = r#"{"apis": [{"controller_name": "Hello", "method_name": "hi",
//!             "code_pos": "src/Hello.java:L0-L1", "http_method": "GET",
//!             "req": {"method": "GET", "path": "/hi"}, "references": []}]}"#;
//!         fs::write(out.join("data/API/Hello.json"), record).unwrap();
//!         Ok(ExtractionReport::default())
//!     }
//! }
//!
//! impl DefinitionLookup for OneEndpoint {
//!     fn lookup(&self, _root: &Path, _symbol: &str) -> wfg::Result<String> {
//!         Ok("[]".to_string())
//!     }
//! }
//!
//! struct Approve;
//!
//! impl TextGenerator for Approve {
//!     fn generate(&self, _request: &GenerationRequest<'_>) -> wfg::Result<String> {
//!         Ok(r#"{"status": "success"}"#.to_string())
//!     }
//! }
//!
//! let project = tempfile::tempdir().unwrap();
//! fs::write(project.path().join("pom.xml"), "<project/>").unwrap();
//! fs::create_dir(project.path().join("src")).unwrap();
//! fs::write(project.path().join("src/Hello.java"), "String hi() { return \"hi\"; }\n").unwrap();
//! let sessions = tempfile::tempdir().unwrap();
//!
//! let config = ConfigBuilder::new()
//!     .project_path(project.path().to_string_lossy())
//!     .session_root(sessions.path())
//!     .build()
//!     .unwrap();
//! let outcome = PipelineRunner::new(config)
//!     .with_generator(Arc::new(Approve))
//!     .with_toolchains(ToolchainRegistry::new().register_adapter("Java", Arc::new(OneEndpoint)))
//!     .run("sa", &CancellationToken::new())
//!     .unwrap();
//!
//! assert_eq!(outcome.final_action, "default");
//! assert_eq!(outcome.context.analysis_results.len(), 1);
//! assert_eq!(outcome.context.analysis_stats.unwrap().success_rate, Some(100.0));
//! ```

pub mod analysis;
pub mod cancellation;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core_types;
pub mod detect;
pub mod errors;
pub mod extractor;
pub mod flow;
pub mod llm;
pub mod progress;
pub mod prompt;
pub mod runner;
pub mod session;
pub mod signal;
pub mod slicer;
pub mod stages;

// Re-export key public types for easier use as a library
pub use cancellation::CancellationToken;
pub use config::{Config, ConfigBuilder};
pub use core_types::{AnalysisResult, AnalysisStatus, ApiInfo, ProjectInfo, SummaryResult};
pub use errors::{Error, Result};
pub use runner::{PipelineRunner, RunOutcome};
