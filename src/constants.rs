// src/constants.rs

/// Default number of analysis workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Default cap on stage executions per run (guards refinement loops).
pub const DEFAULT_MAX_ITERATIONS: usize = 32;

/// Default number of times the summary may send the run back for missing analyses.
pub const DEFAULT_REFINEMENT_ROUNDS: u32 = 1;

/// Default model selector for the text-generation backend.
pub const DEFAULT_MODEL: &str = "qwen";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Default persona sent as the system message.
pub const DEFAULT_SYSTEM_ROLE: &str =
    "You are a experienced programmer and good at understanding programs.";

/// Default per-request timeout for the text-generation backend, in seconds.
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;

/// Default directory under which session directories are created.
pub const DEFAULT_SESSION_ROOT: &str = "logs";

/// Template used by the endpoint analysis stage.
pub const ANALYSIS_TEMPLATE: &str = "SA/api_analysis.json";

/// Environment variable holding the path to the `java` executable.
pub const JAVA_PATH_ENV: &str = "JAVA_PATH";

/// Environment variable holding the path to the Java parser jar.
pub const JAVA_PARSER_ENV: &str = "WFG_JAVA_PARSER";

/// Extensions (with leading dot) that count as source files when scanning.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    ".java", ".py", ".js", ".ts", ".php", ".cs", ".go", ".rb", ".swift", ".kt",
];

// --- Session layout ---

pub const SESSION_INFO_FILE: &str = "session_info.json";
pub const FRAMEWORK_ANALYSIS_FILE: &str = "framework_analysis.json";
pub const API_EXTRACTION_FILE: &str = "api_extraction.json";
pub const SUMMARY_FILE: &str = "summary.json";
pub const DETAILED_LOG_FILE: &str = "wfg_detailed.log";
