// src/cli.rs

use clap::{Parser, Subcommand};

/// LLM-assisted static analysis of web application endpoints.
///
/// wfg detects the project type, extracts every HTTP endpoint with an
/// external parser, and asks a language model to analyze each endpoint
/// together with the definitions it depends on. Results are written to a
/// timestamped session directory.
#[derive(Parser, Debug)]
#[command(name = "wfg", author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the project to analyze.
    #[arg(short = 'p', long, value_name = "PATH")]
    pub project: String,

    /// Directory under which session directories are created [default: logs].
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<String>,

    /// Enable debug logging to the console and to logs/wfg_detailed.log in the session.
    #[arg(short = 'v', long, action = clap::ArgAction::SetTrue)]
    pub verbose: bool,

    /// JSON configuration file. Command-line flags override its values.
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<String>,

    /// Number of endpoints analyzed in parallel.
    #[arg(short = 'j', long, value_name = "N")]
    pub workers: Option<usize>,

    /// Model selector for the text-generation backend (e.g. qwen, deepseek-r1).
    #[arg(short = 'm', long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Directory searched for prompt templates before the built-in ones.
    #[arg(long, value_name = "DIR")]
    pub templates: Option<String>,

    /// Stage group to run [default: all].
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Stage groups.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Commands {
    /// Static analysis: detect, extract, analyze and summarize endpoints.
    Sa,
    /// Dynamic fuzzing (not available in this build).
    Df,
    /// Test script generation (not available in this build).
    Gen,
    /// Every available stage group.
    #[default]
    All,
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Sa => "sa",
            Commands::Df => "df",
            Commands::Gen => "gen",
            Commands::All => "all",
        }
    }

    /// Whether this command runs the static-analysis flow.
    pub fn runs_static_analysis(&self) -> bool {
        matches!(self, Commands::Sa | Commands::All)
    }
}
