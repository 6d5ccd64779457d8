//! Defines the library error type.
//!
//! The `Error` enum separates the failures that abort a run (configuration,
//! unsupported projects, malformed slice descriptors, graph misuse) from the
//! ones that stages recover from locally (lookups, per-item analysis). The
//! recoverable variants still exist here so stages can log them uniformly.

use thiserror::Error;

/// Errors produced by the `wfg` pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    // --- I/O Errors ---
    /// Error occurring during file or directory access (read, write, metadata).
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        /// The path that caused the I/O error.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed or produced.
    #[error("JSON error in {context}: {source}")]
    Json {
        /// What was being read or written.
        context: String,
        #[source]
        source: serde_json::Error,
    },

    // --- Configuration Errors ---
    /// Invalid or incomplete configuration (missing credentials, bad values).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The text-generation backend was asked for a model it does not know.
    #[error("Unsupported model: {0}")]
    UnknownModel(String),

    /// No extractor exists for the detected project type.
    #[error("Unsupported project type: {0}")]
    UnsupportedProjectType(String),

    // --- Source Slicing ---
    /// A `code_pos` descriptor did not match `<path>:L<start>-L<end>`.
    #[error("Malformed slice descriptor '{descriptor}': {reason}")]
    SliceFormat { descriptor: String, reason: String },

    /// The file named by a slice descriptor does not exist.
    #[error("Source file for slice not found: {0}")]
    SliceNotFound(String),

    // --- Prompts ---
    /// A named template or one of its sections could not be loaded.
    #[error("Failed to load prompt template '{name}': {reason}")]
    TemplateLoad { name: String, reason: String },

    // --- External Collaborators ---
    /// The extraction tool could not be run or produced nothing usable.
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// A symbol definition could not be resolved.
    #[error("Definition lookup for '{symbol}' failed: {reason}")]
    DefinitionLookup { symbol: String, reason: String },

    /// The text-generation backend failed or returned an unusable response.
    #[error("Text generation failed: {0}")]
    Llm(String),

    // --- Stage Graph ---
    /// The stage graph is structurally invalid.
    #[error("Invalid stage graph: {0}")]
    Graph(String),

    /// The stage graph kept looping past its configured cap.
    #[error("Stage graph exceeded the limit of {0} stage executions")]
    IterationLimit(usize),

    // --- Signal Handling ---
    /// The run was cancelled (e.g., Ctrl+C).
    #[error("Operation cancelled by user (Ctrl+C)")]
    Interrupted,
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Helper to create an `Error::Io` with path context.
pub fn io_error_with_path<P: AsRef<std::path::Path>>(source: std::io::Error, path: P) -> Error {
    Error::Io {
        path: path.as_ref().display().to_string(),
        source,
    }
}

/// Helper to create an `Error::Json` describing what was being processed.
pub fn json_error(source: serde_json::Error, context: impl Into<String>) -> Error {
    Error::Json {
        context: context.into(),
        source,
    }
}

impl Error {
    /// Returns `true` for errors that should end the whole run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::DefinitionLookup { .. } | Error::Llm(_) | Error::Json { .. }
        )
    }
}
