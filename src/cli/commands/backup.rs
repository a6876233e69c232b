//! Backup command implementation
//!
//! Runs the export of every user kind in the namespace, or with `--dry-run`
//! prints what would be exported. Written destinations go to stdout, one per
//! line; everything else goes to stderr.

use super::exit_code_for;
use crate::cli::spinner::SpinnerReporter;
use crate::cli::{Cli, EXIT_INTERRUPTED, EXIT_OK};
use crate::config::BackupConfig;
use crate::adapters::datastore::OperationName;
use crate::core::backup::{
    BackupCoordinator, BackupPlan, BackupRun, Batch, InFlightExport, LogReporter,
    ProgressReporter, RunFailure,
};
use crate::domain::{ExportProgress, ExportResult};
use crate::log_error_with_context;
use std::sync::Arc;
use tokio::sync::watch;

/// Fans events out to the log, the console spinner and the in-flight tracker
struct ConsoleReporter {
    log: LogReporter,
    spinner: SpinnerReporter,
    in_flight: InFlightExport,
}

impl ProgressReporter for ConsoleReporter {
    fn run_started(&self, run: &BackupRun) {
        self.log.run_started(run);
        self.spinner.run_started(run);
    }

    fn kinds_listed(&self, kind_count: usize, batch_count: usize) {
        self.log.kinds_listed(kind_count, batch_count);
        self.spinner.kinds_listed(kind_count, batch_count);
    }

    fn batch_started(&self, batch_index: usize, batch: &Batch, destination: &str) {
        self.log.batch_started(batch_index, batch, destination);
        self.spinner.batch_started(batch_index, batch, destination);
    }

    fn export_submitted(&self, batch_index: usize, operation: &OperationName) {
        self.log.export_submitted(batch_index, operation);
        self.in_flight.export_submitted(batch_index, operation);
    }

    fn batch_progress(&self, batch_index: usize, progress: &ExportProgress) {
        self.log.batch_progress(batch_index, progress);
        self.spinner.batch_progress(batch_index, progress);
    }

    fn batch_finished(&self, result: &ExportResult) {
        self.log.batch_finished(result);
        self.spinner.batch_finished(result);
        self.in_flight.batch_finished(result);
    }

    fn run_finished(&self, run: &BackupRun) {
        self.log.run_finished(run);
    }

    fn run_failed(&self, failure: &RunFailure) {
        self.spinner.run_failed(failure);
        self.log.run_failed(failure);
        self.in_flight.run_failed(failure);
    }
}

/// Execute the backup
///
/// `in_flight` is kept pointing at the operation being awaited, so a second
/// signal can report it before the process gives up waiting.
pub async fn execute(
    cli: &Cli,
    config: &BackupConfig,
    shutdown_signal: watch::Receiver<bool>,
    in_flight: InFlightExport,
) -> anyhow::Result<i32> {
    let reporter = Arc::new(ConsoleReporter {
        log: LogReporter::new(),
        spinner: SpinnerReporter::new(cli.quiet),
        in_flight,
    });

    let coordinator = match BackupCoordinator::from_config(config, reporter, shutdown_signal) {
        Ok(c) => c,
        Err(e) => {
            log_error_with_context!(&e, "Failed to initialize backup");
            eprintln!("Error: {}", e.message());
            return Ok(exit_code_for(&e));
        }
    };

    match coordinator.execute_backup().await {
        Ok(run) => {
            print_destinations(&run);
            if run.is_interrupted() {
                eprintln!(
                    "Backup interrupted after {} of {} batches",
                    run.results.len(),
                    run.batch_count
                );
                return Ok(EXIT_INTERRUPTED);
            }
            Ok(EXIT_OK)
        }
        Err(failure) => {
            // Batches written before the failure stay in the bucket
            print_destinations(&failure.partial);
            eprintln!("Error: {}", failure.error.message());
            Ok(exit_code_for(&failure.error))
        }
    }
}

/// List kinds and planned destinations without exporting
pub async fn execute_dry_run(config: &BackupConfig) -> anyhow::Result<i32> {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let reporter = Arc::new(LogReporter::new());
    let coordinator = match BackupCoordinator::from_config(config, reporter, shutdown_rx) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e.message());
            return Ok(exit_code_for(&e));
        }
    };

    match coordinator.plan().await {
        Ok(plan) => {
            print!("{}", render_plan(&plan));
            Ok(EXIT_OK)
        }
        Err(e) => {
            log_error_with_context!(&e, "Dry run failed");
            eprintln!("Error: {}", e.message());
            Ok(exit_code_for(&e))
        }
    }
}

fn print_destinations(run: &BackupRun) {
    for url in run.destination_urls() {
        println!("{url}");
    }
}

/// Human-readable dry-run report
pub fn render_plan(plan: &BackupPlan) -> String {
    let mut out = String::new();
    let namespace = if plan.namespace.is_default() {
        "(default)"
    } else {
        plan.namespace.as_str()
    };

    out.push_str("DRY RUN - nothing will be exported\n");
    out.push_str(&format!("Backup name: {}\n", plan.backup_name));
    out.push_str(&format!("Namespace: {namespace}\n"));
    out.push_str(&format!(
        "Kinds: {} in {} batch(es)\n",
        plan.kinds.len(),
        plan.batches.len()
    ));

    for batch in &plan.batches {
        let kinds: Vec<&str> = batch.kinds.iter().map(|k| k.as_str()).collect();
        out.push_str(&format!(
            "  [{}] {} <- {}\n",
            batch.batch_index,
            batch.destination_url,
            kinds.join(", ")
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backup::PlannedBatch;
    use crate::domain::{KindName, NamespaceName};

    #[test]
    fn test_render_plan() {
        let order = KindName::new("Order").unwrap();
        let user = KindName::new("User").unwrap();
        let plan = BackupPlan {
            backup_name: "nightly".to_string(),
            namespace: NamespaceName::default(),
            kinds: vec![order.clone(), user.clone()],
            batches: vec![PlannedBatch {
                batch_index: 0,
                kinds: vec![order, user],
                destination_url: "gs://b/bak/nightly-0".to_string(),
            }],
        };

        let rendered = render_plan(&plan);
        assert!(rendered.contains("Backup name: nightly"));
        assert!(rendered.contains("Namespace: (default)"));
        assert!(rendered.contains("Kinds: 2 in 1 batch(es)"));
        assert!(rendered.contains("  [0] gs://b/bak/nightly-0 <- Order, User"));
    }
}
