//! Progress reporting hooks
//!
//! Progress is observational only: reporters never influence control flow.

use super::batch::Batch;
use super::summary::{BackupRun, RunFailure};
use crate::adapters::datastore::OperationName;
use crate::domain::{ExportProgress, ExportResult};
use crate::log_batch_processing;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Receives run and batch lifecycle events
///
/// Every hook defaults to a no-op.
pub trait ProgressReporter: Send + Sync {
    fn run_started(&self, _run: &BackupRun) {}

    fn kinds_listed(&self, _kind_count: usize, _batch_count: usize) {}

    fn batch_started(&self, _batch_index: usize, _batch: &Batch, _destination: &str) {}

    /// The service accepted the export of a batch
    fn export_submitted(&self, _batch_index: usize, _operation: &OperationName) {}

    /// Latest snapshot of a running export
    fn batch_progress(&self, _batch_index: usize, _progress: &ExportProgress) {}

    fn batch_finished(&self, _result: &ExportResult) {}

    fn run_finished(&self, _run: &BackupRun) {}

    fn run_failed(&self, _failure: &RunFailure) {}
}

/// Reports nothing
#[derive(Debug, Default)]
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}

/// Reports through `tracing` events
#[derive(Debug, Default)]
pub struct LogReporter {
    batch_count: AtomicUsize,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressReporter for LogReporter {
    fn run_started(&self, run: &BackupRun) {
        tracing::info!(
            backup_name = %run.backup_name,
            project_id = %run.project_id,
            namespace = %run.namespace,
            destination = %run.backup_root(),
            "Starting backup"
        );
    }

    fn kinds_listed(&self, kind_count: usize, batch_count: usize) {
        self.batch_count.store(batch_count, Ordering::Relaxed);
        tracing::info!(kinds = kind_count, batches = batch_count, "Listed kinds");
    }

    fn batch_started(&self, batch_index: usize, batch: &Batch, destination: &str) {
        log_batch_processing!(
            batch_index,
            self.batch_count.load(Ordering::Relaxed),
            destination
        );
        tracing::debug!(batch_index, kinds = %batch, "Batch contents");
    }

    fn export_submitted(&self, batch_index: usize, operation: &OperationName) {
        tracing::info!(batch_index, operation = %operation, "Export submitted");
    }

    fn batch_progress(&self, batch_index: usize, progress: &ExportProgress) {
        tracing::debug!(
            batch_index,
            bytes = progress.bytes_completed,
            bytes_estimated = progress.bytes_estimated,
            entities = progress.entities_completed,
            "Export in progress"
        );
    }

    fn batch_finished(&self, result: &ExportResult) {
        tracing::info!(
            batch_index = result.batch_index,
            destination = %result.destination_url,
            entities = result.entities_transferred,
            bytes = result.bytes_transferred,
            elapsed_secs = result.elapsed_seconds,
            "Batch exported"
        );
    }

    fn run_finished(&self, run: &BackupRun) {
        run.log_summary();
    }

    fn run_failed(&self, failure: &RunFailure) {
        tracing::error!(
            error = %failure.error,
            completed_batches = failure.partial.results.len(),
            "Backup failed"
        );
        for url in failure.partial.destination_urls() {
            tracing::warn!(destination = %url, "Batch written before the failure");
        }
    }
}

/// Remembers the operation currently being awaited
///
/// Clones share state, so one copy can be handed to the run while another is
/// read from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct InFlightExport {
    operation: Arc<Mutex<Option<OperationName>>>,
}

impl InFlightExport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The operation of the batch being exported, if any
    pub fn current(&self) -> Option<OperationName> {
        self.operation.lock().ok().and_then(|guard| guard.clone())
    }

    fn set(&self, operation: Option<OperationName>) {
        if let Ok(mut guard) = self.operation.lock() {
            *guard = operation;
        }
    }
}

impl ProgressReporter for InFlightExport {
    fn export_submitted(&self, _batch_index: usize, operation: &OperationName) {
        self.set(Some(operation.clone()));
    }

    fn batch_finished(&self, _result: &ExportResult) {
        self.set(None);
    }

    fn run_failed(&self, _failure: &RunFailure) {
        self.set(None);
    }
}
