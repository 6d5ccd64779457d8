//! Per-endpoint analysis and result statistics.

pub mod endpoint;
pub mod stats;

pub use endpoint::{collect_symbols, EndpointAnalyzer, GenerationSettings};
pub use stats::{classify_status, compute_stats, parse_analysis_json, strip_code_fences};
