//! Export invocation
//!
//! Submits one batch as an export operation and polls it to a terminal
//! state. There is no timeout and no retry: the first failure of the
//! operation, or of talking to the service about it, fails the batch.

use super::batch::Batch;
use super::naming::destination_url;
use super::progress::ProgressReporter;
use crate::adapters::datastore::{DatastoreAdmin, OperationName, OperationStatus};
use crate::domain::{BackupError, ExportOutcome, ExportRequest, ExportResult, NamespaceName, Result};
use std::sync::Arc;
use std::time::Duration;

/// Exports batches of one namespace
pub struct ExportInvoker {
    admin: Arc<dyn DatastoreAdmin>,
    namespace: NamespaceName,
    poll_interval: Duration,
    reporter: Arc<dyn ProgressReporter>,
}

impl ExportInvoker {
    pub fn new(
        admin: Arc<dyn DatastoreAdmin>,
        namespace: NamespaceName,
        poll_interval: Duration,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            admin,
            namespace,
            poll_interval,
            reporter,
        }
    }

    /// Exports `batch` under `gs://{bucket}/{dir_prefix}/{run_label}-{batch_index}`
    ///
    /// # Errors
    ///
    /// Any failure is an [`BackupError::Export`] for `batch_index` carrying the
    /// service's message.
    pub async fn export_batch(
        &self,
        batch: &Batch,
        bucket: &str,
        dir_prefix: &str,
        run_label: &str,
        batch_index: usize,
    ) -> Result<ExportResult> {
        let destination = destination_url(bucket, dir_prefix, run_label, batch_index, batch);
        self.reporter.batch_started(batch_index, batch, &destination);

        let request = ExportRequest::new(
            destination.clone(),
            batch.kinds().to_vec(),
            self.namespace.clone(),
        );

        let operation = self
            .admin
            .start_export(&request)
            .await
            .map_err(|e| BackupError::export(batch_index, e.message()))?;

        self.reporter.export_submitted(batch_index, &operation);

        let outcome = self.wait_for(&operation, batch_index).await?;

        let result = ExportResult {
            batch_index,
            kinds: batch.kinds().to_vec(),
            destination_url: outcome.output_url.clone().unwrap_or(destination),
            bytes_transferred: outcome.progress.bytes_completed,
            entities_transferred: outcome.progress.entities_completed,
            elapsed_seconds: outcome.elapsed_seconds(),
        };

        self.reporter.batch_finished(&result);
        Ok(result)
    }

    async fn wait_for(&self, operation: &OperationName, batch_index: usize) -> Result<ExportOutcome> {
        loop {
            let status = self
                .admin
                .get_operation(operation)
                .await
                .map_err(|e| BackupError::export(batch_index, e.message()))?;

            match status {
                OperationStatus::Running(progress) => {
                    self.reporter.batch_progress(batch_index, &progress);
                    tokio::time::sleep(self.poll_interval).await;
                }
                OperationStatus::Succeeded(outcome) => return Ok(outcome),
                OperationStatus::Failed(message) => {
                    return Err(BackupError::export(batch_index, message))
                }
            }
        }
    }
}
