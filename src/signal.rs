// src/signal.rs

//! Provides signal handling for graceful shutdown.

use crate::cancellation::CancellationToken;
use crate::errors::{Error, Result};

/// Installs a Ctrl+C (SIGINT/SIGTERM) handler that cancels the returned token.
///
/// In-flight LLM calls are allowed to finish; workers that have not started
/// yet see the cancelled token and skip their endpoint. The stage graph then
/// stops before the next stage.
///
/// # Errors
/// Returns `Error::Config` if the handler cannot be installed (for example,
/// because another handler was already registered in this process).
pub fn setup_signal_handler() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let handler_token = token.clone();

    ctrlc::set_handler(move || {
        log::info!("Ctrl+C signal received, finishing in-flight work and stopping.");
        handler_token.cancel();
    })
    .map_err(|e| Error::Config(format!("Failed to set Ctrl+C signal handler: {e}")))?;

    Ok(token)
}
