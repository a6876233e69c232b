//! Console progress for interactive runs
//!
//! One spinner per batch on stderr. Hidden when `--quiet` is given or stderr
//! is not a terminal.

use crate::core::backup::{BackupRun, Batch, ProgressReporter, RunFailure};
use crate::domain::{ExportProgress, ExportResult};
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use std::sync::Mutex;
use std::time::Duration;

/// Renders batch progress as `indicatif` spinners
pub struct SpinnerReporter {
    enabled: bool,
    current: Mutex<Option<ProgressBar>>,
}

impl SpinnerReporter {
    pub fn new(quiet: bool) -> Self {
        Self {
            enabled: !quiet && std::io::stderr().is_terminal(),
            current: Mutex::new(None),
        }
    }

    fn create_spinner(&self, prefix: String) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✔"]),
        );
        pb.set_prefix(prefix);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    fn with_current(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.current.lock() {
            if let Some(pb) = guard.as_ref() {
                f(pb);
            }
        }
    }

    fn take_current(&self) -> Option<ProgressBar> {
        self.current.lock().ok().and_then(|mut guard| guard.take())
    }
}

/// `{done} of {estimated} {pct}%`, or just `{done}` while there is no estimate
pub fn format_progress(progress: &ExportProgress) -> String {
    match progress.percent() {
        Some(pct) => format!(
            "{} of {} {pct:.1}%",
            HumanBytes(progress.bytes_completed),
            HumanBytes(progress.bytes_estimated)
        ),
        None => HumanBytes(progress.bytes_completed).to_string(),
    }
}

/// Completion line of one batch
pub fn format_finished(result: &ExportResult) -> String {
    format!(
        "Dumping finished {} records ({}) in {}s",
        result.entities_transferred,
        HumanBytes(result.bytes_transferred),
        result.elapsed_seconds
    )
}

/// Headline printed when a run starts
pub fn format_run_started(run: &BackupRun) -> String {
    format!("backup to {}", run.backup_root())
}

/// Kind count printed once the kinds are listed
pub fn format_kinds_listed(kind_count: usize, batch_count: usize) -> String {
    format!("{kind_count} Kinds in {batch_count} batch(es)")
}

impl ProgressReporter for SpinnerReporter {
    fn run_started(&self, run: &BackupRun) {
        if self.enabled {
            eprintln!("{}", format_run_started(run));
        }
    }

    fn kinds_listed(&self, kind_count: usize, batch_count: usize) {
        if self.enabled {
            eprintln!("{}", format_kinds_listed(kind_count, batch_count));
        }
    }

    fn batch_started(&self, _batch_index: usize, batch: &Batch, destination: &str) {
        let pb = self.create_spinner(format!("Dumping {batch} to {destination}"));
        if let Ok(mut guard) = self.current.lock() {
            if let Some(previous) = guard.replace(pb) {
                previous.finish_and_clear();
            }
        }
    }

    fn batch_progress(&self, _batch_index: usize, progress: &ExportProgress) {
        let message = format_progress(progress);
        self.with_current(|pb| pb.set_message(message));
    }

    fn batch_finished(&self, result: &ExportResult) {
        if let Some(pb) = self.take_current() {
            pb.set_prefix(String::new());
            pb.finish_with_message(format_finished(result));
        }
    }

    fn run_failed(&self, failure: &RunFailure) {
        if let Some(pb) = self.take_current() {
            pb.abandon_with_message(format!("failed: {}", failure.error.message()));
        }
    }
}
