// src/progress.rs

//! Progress reporting for the endpoint analysis fan-out.
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Receives progress updates from long-running stages.
///
/// # Examples
///
/// ```
/// use wfg::progress::ProgressReporter;
/// use std::sync::atomic::{AtomicU64, Ordering};
///
/// struct Counter(AtomicU64);
///
/// impl ProgressReporter for Counter {
///     fn start(&self, _total: u64, _label: &str) {}
///     fn advance(&self, _item: &str) {
///         self.0.fetch_add(1, Ordering::SeqCst);
///     }
///     fn finish(&self, _summary: String) {}
/// }
///
/// let counter = Counter(AtomicU64::new(0));
/// counter.advance("UserController.create");
/// assert_eq!(counter.0.load(Ordering::SeqCst), 1);
/// ```
pub trait ProgressReporter: Send + Sync {
    /// Announces `total` items of work.
    fn start(&self, total: u64, label: &str);
    /// One item (named `item`) has finished, successfully or not.
    fn advance(&self, item: &str);
    /// All work is done.
    fn finish(&self, summary: String);
}

/// A `ProgressReporter` that does nothing.
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    fn start(&self, _total: u64, _label: &str) {}
    fn advance(&self, _item: &str) {}
    fn finish(&self, _summary: String) {}
}

/// A terminal progress bar.
#[cfg(feature = "progress")]
#[derive(Clone)]
pub struct IndicatifProgress {
    bar: ProgressBar,
}

#[cfg(feature = "progress")]
impl IndicatifProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} {prefix} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }
}

#[cfg(feature = "progress")]
impl Default for IndicatifProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "progress")]
impl ProgressReporter for IndicatifProgress {
    fn start(&self, total: u64, label: &str) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_prefix(label.to_string());
    }

    fn advance(&self, item: &str) {
        self.bar.set_message(item.to_string());
        self.bar.inc(1);
    }

    fn finish(&self, summary: String) {
        self.bar.finish_with_message(summary);
    }
}
