//! Defines the data model shared by every stage of the pipeline.
//!
//! Endpoint records (`ApiInfo`, `HttpRequest`) are produced by the external
//! extractor and deserialized as-is; everything else is produced by the
//! stages themselves. All types serialize to the JSON shapes written into the
//! session directory.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// One scanned source file of the project.
///
/// # Examples
///
/// ```
/// use wfg::core_types::FileInfo;
/// use std::path::PathBuf;
///
/// let info = FileInfo {
///     path: PathBuf::from("/proj/src/UserController.java"),
///     size_bytes: 2048,
///     file_type: ".java".to_string(),
/// };
/// assert_eq!(info.file_type, ".java");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes from filesystem metadata.
    #[serde(alias = "size")]
    pub size_bytes: u64,
    /// Extension including the leading dot (e.g. `.java`).
    pub file_type: String,
}

/// Project-level facts gathered by the detection stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    /// Detected ecosystem, e.g. `Java`. `Unknown` when nothing matched.
    pub project_type: String,
    /// Absolute root of the analyzed project.
    pub root_path: PathBuf,
    /// Source files found under `root_path`.
    pub files: Vec<FileInfo>,
}

impl ProjectInfo {
    /// Creates a `ProjectInfo` with no detected type and no files yet.
    pub fn new(root_path: impl Into<PathBuf>) -> Self {
        Self {
            project_type: String::from("Unknown"),
            root_path: root_path.into(),
            files: Vec::new(),
        }
    }
}

/// The HTTP request shape of an endpoint, as reported by the extractor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    #[serde(default)]
    pub body: BTreeMap<String, Value>,
}

/// One discovered endpoint (controller method exposed over HTTP).
///
/// `code_pos` has the form `<relative-path>:L<start>-L<end>`; see
/// [`crate::slicer::SliceDescriptor`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiInfo {
    pub controller_name: String,
    pub method_name: String,
    pub code_pos: String,
    #[serde(default)]
    pub http_method: String,
    pub req: HttpRequest,
    #[serde(default)]
    pub references: Vec<String>,
}

impl ApiInfo {
    /// A short `Controller.method` label for logs and file names.
    pub fn label(&self) -> String {
        format!("{}.{}", self.controller_name, self.method_name)
    }

    /// Checks that `code_pos` is a well-formed slice descriptor.
    ///
    /// # Errors
    /// `Error::SliceFormat` describing what is wrong with `code_pos`.
    pub fn validate(&self) -> crate::errors::Result<()> {
        crate::slicer::SliceDescriptor::parse(&self.code_pos).map(|_| ())
    }
}

/// Outcome classification of one endpoint analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// The model reported `"status": "success"`.
    Success,
    /// The model returned a parseable verdict other than success.
    Fail,
    /// No parseable verdict was found in the completion.
    #[default]
    Incomplete,
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AnalysisStatus::Success => "success",
            AnalysisStatus::Fail => "fail",
            AnalysisStatus::Incomplete => "incomplete",
        };
        f.write_str(s)
    }
}

/// The analysis of one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Position of `api_info` in the context's `apis` list.
    pub index: usize,
    pub api_info: ApiInfo,
    /// Raw completion text returned by the backend.
    pub analysis: String,
    pub status: AnalysisStatus,
}

impl AnalysisResult {
    /// Creates a result that has not received a completion yet.
    pub fn pending(index: usize, api_info: ApiInfo) -> Self {
        Self {
            index,
            api_info,
            analysis: String::new(),
            status: AnalysisStatus::Incomplete,
        }
    }
}

/// Aggregate statistics over a batch of analysis texts.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Number of results the stage collected.
    pub total_collected: usize,
    /// Number of results whose text parsed as a JSON object.
    pub parsed: usize,
    /// Number of parsed results with `status == "success"`.
    pub successes: usize,
    /// `successes / parsed * 100`, rounded to two decimals. `None` when nothing parsed.
    pub success_rate: Option<f64>,
}

/// Terminal artifact of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub total_apis: usize,
    pub api_summary: String,
    pub recommendations: Vec<String>,
    pub analysis_results: Vec<AnalysisResult>,
}
