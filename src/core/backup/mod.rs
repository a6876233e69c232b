//! Backup orchestration
//!
//! This module provides the backup logic, including:
//! - Listing namespaces and kinds
//! - Splitting kinds into export batches
//! - Running and polling one export per batch
//! - Coordinating a run and summarizing it

pub mod batch;
pub mod coordinator;
pub mod invoker;
pub mod lister;
pub mod naming;
pub mod progress;
pub mod summary;

pub use batch::{split_into_batches, Batch, BATCH_LIMIT};
pub use coordinator::BackupCoordinator;
pub use invoker::ExportInvoker;
pub use lister::MetadataLister;
pub use naming::{default_run_label, destination_url, Clock, FixedClock, SystemClock};
pub use progress::{InFlightExport, LogReporter, ProgressReporter, SilentReporter};
pub use summary::{BackupPlan, BackupRun, PlannedBatch, RunFailure, RunState};
