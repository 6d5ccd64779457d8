//! The stages of the static-analysis flow, in execution order:
//!
//! 1. [`ProjectAnalysisStage`] detects the project type and lists sources.
//! 2. [`ApiExtractionStage`] runs the external extractor and loads endpoints.
//! 3. [`ContextExtensionStage`] analyzes every endpoint concurrently.
//! 4. [`SummaryGenerationStage`] writes the report and may loop back to 3.

pub mod api_extraction;
pub mod context_extension;
pub mod project_analysis;
pub mod summary_generation;

pub use api_extraction::ApiExtractionStage;
pub use context_extension::{ContextExtensionStage, PromptSource};
pub use project_analysis::ProjectAnalysisStage;
pub use summary_generation::{SummaryAction, SummaryGenerationStage, NEEDS_MORE_INFO};
