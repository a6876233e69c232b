//! Backup coordinator - main orchestrator for a backup run
//!
//! Drives one run through `Idle -> ListingKinds -> Exporting(i) -> Done`,
//! stopping at the first failed batch. Batches run strictly one after another.

use super::batch::split_into_batches;
use super::invoker::ExportInvoker;
use super::lister::MetadataLister;
use super::naming::{default_run_label, destination_url, Clock, SystemClock};
use super::progress::ProgressReporter;
use super::summary::{BackupPlan, BackupRun, PlannedBatch, RunFailure, RunState};
use crate::adapters::datastore::{DatastoreAdmin, DatastoreClient, DatastoreQuery};
use crate::config::BackupConfig;
use crate::domain::{BackupError, NamespaceName, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Backup coordinator
pub struct BackupCoordinator {
    project_id: String,
    namespace: NamespaceName,
    bucket: String,
    backup_dir: String,
    backup_name: Option<String>,
    batch_size: usize,
    lister: MetadataLister,
    invoker: ExportInvoker,
    reporter: Arc<dyn ProgressReporter>,
    clock: Arc<dyn Clock>,
    shutdown: watch::Receiver<bool>,
}

impl BackupCoordinator {
    /// Create a coordinator talking to Cloud Datastore over REST
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the client cannot be created
    /// (for example when no credentials are available).
    pub fn from_config(
        config: &BackupConfig,
        reporter: Arc<dyn ProgressReporter>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        let client = Arc::new(DatastoreClient::new(&config.datastore)?);
        Ok(Self::new(
            client.clone(),
            client,
            config,
            reporter,
            shutdown,
        ))
    }

    /// Create a coordinator over explicit Datastore collaborators
    pub fn new(
        query: Arc<dyn DatastoreQuery>,
        admin: Arc<dyn DatastoreAdmin>,
        config: &BackupConfig,
        reporter: Arc<dyn ProgressReporter>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let namespace = config.datastore.namespace_name().unwrap_or_default();
        let invoker = ExportInvoker::new(
            admin,
            namespace.clone(),
            Duration::from_millis(config.datastore.poll_interval_ms),
            reporter.clone(),
        );

        Self {
            project_id: config.datastore.project_id.clone(),
            namespace,
            bucket: config.backup.bucket.clone(),
            backup_dir: config.backup.backup_dir.clone(),
            backup_name: config.backup.backup_name.clone(),
            batch_size: config.backup.batch_size,
            lister: MetadataLister::new(query),
            invoker,
            reporter,
            clock: Arc::new(SystemClock),
            shutdown,
        }
    }

    /// Replace the clock used for generated run labels
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The configured backup name, or a label generated from the current time
    pub fn resolve_run_label(&self) -> String {
        match &self.backup_name {
            Some(name) => name.clone(),
            None => default_run_label(self.clock.now(), &self.project_id, Some(&self.namespace)),
        }
    }

    /// All namespaces of the project
    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceName>> {
        self.lister.list_namespaces().await
    }

    /// Lists kinds and computes every batch destination without exporting
    pub async fn plan(&self) -> Result<BackupPlan> {
        let backup_name = self.resolve_run_label();
        let kinds = self.lister.list_kind_names().await?;
        let batches = split_into_batches(&kinds, self.batch_size)?;

        let batches = batches
            .iter()
            .enumerate()
            .map(|(index, batch)| {
                let url = destination_url(
                    &self.bucket,
                    &self.backup_dir,
                    &backup_name,
                    index,
                    batch,
                );
                PlannedBatch::new(index, batch, url)
            })
            .collect();

        Ok(BackupPlan {
            backup_name,
            namespace: self.namespace.clone(),
            kinds,
            batches,
        })
    }

    /// Execute the backup
    ///
    /// 1. Resolves the run label
    /// 2. Lists the user kinds of the namespace
    /// 3. Splits them into batches
    /// 4. Exports each batch in order, waiting for each operation to finish
    ///
    /// A shutdown signal stops the run before the next batch; the batch in
    /// flight is awaited since its operation continues server-side anyway.
    ///
    /// # Errors
    ///
    /// On the first metadata or export failure, returns the error together
    /// with the results of the batches that completed before it.
    pub async fn execute_backup(&self) -> std::result::Result<BackupRun, RunFailure> {
        let start_time = Instant::now();
        let backup_name = self.resolve_run_label();

        let mut run = BackupRun::new(
            backup_name.clone(),
            self.backup_dir.clone(),
            self.bucket.clone(),
            self.project_id.clone(),
            self.namespace.clone(),
        );

        self.reporter.run_started(&run);

        run.state = RunState::ListingKinds;
        let kinds = match self.lister.list_kind_names().await {
            Ok(kinds) => kinds,
            Err(e) => return Err(self.fail(e, run, start_time)),
        };

        let batches = match split_into_batches(&kinds, self.batch_size) {
            Ok(batches) => batches,
            Err(e) => return Err(self.fail(e, run, start_time)),
        };

        run.kind_count = kinds.len();
        run.batch_count = batches.len();
        self.reporter.kinds_listed(kinds.len(), batches.len());

        if batches.is_empty() {
            tracing::warn!(namespace = %self.namespace, "No kinds to export");
        }

        for (index, batch) in batches.iter().enumerate() {
            if *self.shutdown.borrow() {
                tracing::warn!(
                    next_batch = index,
                    "Shutdown requested, not starting further batches"
                );
                run.state = RunState::Interrupted;
                break;
            }

            run.state = RunState::Exporting(index);
            match self
                .invoker
                .export_batch(batch, &self.bucket, &self.backup_dir, &backup_name, index)
                .await
            {
                Ok(result) => run.results.push(result),
                Err(e) => return Err(self.fail(e, run, start_time)),
            }
        }

        if run.state != RunState::Interrupted {
            run.state = RunState::Done;
        }
        run.duration = start_time.elapsed();
        self.reporter.run_finished(&run);

        Ok(run)
    }

    fn fail(&self, error: BackupError, mut run: BackupRun, start_time: Instant) -> RunFailure {
        run.duration = start_time.elapsed();
        let failure = RunFailure::new(error, run);
        self.reporter.run_failed(&failure);
        failure
    }
}
