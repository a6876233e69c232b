//! Backup run records and reporting

use super::batch::Batch;
use super::naming::join_path;
use crate::domain::{BackupError, ExportResult, KindName, NamespaceName};
use std::time::Duration;
use thiserror::Error;

/// Lifecycle of a backup run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    ListingKinds,
    /// Exporting the batch with this index
    Exporting(usize),
    Done,
    Failed,
    /// Stopped by a shutdown signal before all batches ran
    Interrupted,
}

/// Record of one backup run
#[derive(Debug, Clone)]
pub struct BackupRun {
    /// Run label (backup name)
    pub backup_name: String,
    pub backup_dir: String,
    pub bucket: String,
    pub project_id: String,
    pub namespace: NamespaceName,
    /// Number of user kinds found
    pub kind_count: usize,
    /// Number of batches planned
    pub batch_count: usize,
    /// Results of completed batches, in batch order
    pub results: Vec<ExportResult>,
    pub state: RunState,
    pub duration: Duration,
}

impl BackupRun {
    pub fn new(
        backup_name: String,
        backup_dir: String,
        bucket: String,
        project_id: String,
        namespace: NamespaceName,
    ) -> Self {
        Self {
            backup_name,
            backup_dir,
            bucket,
            project_id,
            namespace,
            kind_count: 0,
            batch_count: 0,
            results: Vec::new(),
            state: RunState::Idle,
            duration: Duration::from_secs(0),
        }
    }

    /// `gs://{bucket}/{dir}/{name}`, the common prefix of every batch destination
    pub fn backup_root(&self) -> String {
        format!(
            "gs://{}",
            join_path(&[&self.bucket, &self.backup_dir, &self.backup_name])
        )
    }

    /// Destination URLs of the completed batches, in batch order
    pub fn destination_urls(&self) -> Vec<&str> {
        self.results
            .iter()
            .map(|r| r.destination_url.as_str())
            .collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.bytes_transferred).sum()
    }

    pub fn total_entities(&self) -> u64 {
        self.results.iter().map(|r| r.entities_transferred).sum()
    }

    pub fn is_interrupted(&self) -> bool {
        self.state == RunState::Interrupted
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            backup_name = %self.backup_name,
            project_id = %self.project_id,
            namespace = %self.namespace,
            kinds = self.kind_count,
            batches_completed = self.results.len(),
            batches_planned = self.batch_count,
            entities = self.total_entities(),
            bytes = self.total_bytes(),
            duration_secs = self.duration.as_secs(),
            state = ?self.state,
            "Backup run finished"
        );

        if self.is_interrupted() {
            tracing::warn!(
                skipped_batches = self.batch_count - self.results.len(),
                "Backup interrupted before all batches were exported"
            );
        }
    }
}

/// A failed run: the error plus whatever completed before it
///
/// The partial run is diagnostic only; nothing it lists is rolled back.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct RunFailure {
    #[source]
    pub error: BackupError,
    pub partial: BackupRun,
}

impl RunFailure {
    pub fn new(error: BackupError, mut partial: BackupRun) -> Self {
        partial.state = RunState::Failed;
        Self { error, partial }
    }
}

/// One planned export of a dry run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedBatch {
    pub batch_index: usize,
    pub kinds: Vec<KindName>,
    pub destination_url: String,
}

impl PlannedBatch {
    pub fn new(batch_index: usize, batch: &Batch, destination_url: String) -> Self {
        Self {
            batch_index,
            kinds: batch.kinds().to_vec(),
            destination_url,
        }
    }
}

/// What a run would do, without exporting anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    pub backup_name: String,
    pub namespace: NamespaceName,
    pub kinds: Vec<KindName>,
    pub batches: Vec<PlannedBatch>,
}
