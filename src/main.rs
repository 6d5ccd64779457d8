// src/main.rs

use anyhow::Result;
use clap::Parser;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;
use wfg::cli::Cli;
use wfg::config::ConfigBuilder;
use wfg::constants::DETAILED_LOG_FILE;
use wfg::errors::Error;
#[cfg(feature = "progress")]
use wfg::progress::IndicatifProgress;
use wfg::progress::ProgressReporter;
use wfg::runner::PipelineRunner;
use wfg::signal::setup_signal_handler;

/// Console logging to stderr, plus a plain-text debug log inside the
/// session when `detailed_log` is set.
fn init_logging(verbose: bool, detailed_log: Option<&Path>) -> Result<()> {
    let directive = if verbose || cfg!(debug_assertions) {
        "wfg=debug"
    } else {
        "wfg=info"
    };
    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env().add_directive(directive.parse()?));

    let detailed = match detailed_log {
        Some(path) => {
            let file = File::create(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("wfg=debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(detailed)
        .try_init()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or_default();

    // --- Configuration ---
    // An invalid project path or config file ends the run before anything is written.
    let config = match ConfigBuilder::from_cli(&cli).build() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if !command.runs_static_analysis() {
        println!(
            "wfg: the '{}' stage group is not available in this build.",
            command.name()
        );
        return Ok(());
    }

    // Decide whether to show a progress bar. Show it if stderr is a TTY.
    let progress_reporter: Option<Arc<dyn ProgressReporter>> = {
        #[cfg(feature = "progress")]
        {
            if atty::is(atty::Stream::Stderr) {
                Some(Arc::new(IndicatifProgress::new()))
            } else {
                None
            }
        }
        #[cfg(not(feature = "progress"))]
        {
            None
        }
    };

    let verbose = config.verbose;
    let runner = PipelineRunner::new(config).with_progress(progress_reporter);
    let mut context = match runner.start_session(command.name()) {
        Ok(context) => context,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let session_dir = context
        .session
        .as_ref()
        .map(|s| s.dir.clone())
        .unwrap_or_default();

    let detailed_log = session_dir.join("logs").join(DETAILED_LOG_FILE);
    init_logging(verbose, verbose.then_some(detailed_log.as_path()))?;
    log::info!("Starting wfg v{}...", env!("CARGO_PKG_VERSION"));
    log::debug!("Raw arguments: {:?}", std::env::args().collect::<Vec<_>>());
    log::info!("Session directory: {}", session_dir.display());
    if command.name() == "all" {
        log::info!("Stage groups 'df' and 'gen' are not available; running 'sa' only.");
    }

    let token = setup_signal_handler()?;

    // --- Execution & Error Handling ---
    match runner.execute(&mut context, &token) {
        Ok(action) => {
            log::debug!("Flow ended with action '{}'", action);
            if let Some(summary) = &context.final_summary {
                println!("{}", summary.api_summary);
            }
            println!("SA analysis completed. Results in {}", session_dir.display());
            Ok(())
        }
        Err(Error::Interrupted) => {
            eprintln!("\nOperation cancelled. Partial results in {}", session_dir.display());
            std::process::exit(130);
        }
        Err(e) => {
            log::error!("SA analysis failed: {}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
