// datastore-backup - Cloud Datastore export orchestrator
// Copyright (c) 2025 datastore-backup Contributors
// Licensed under the MIT License

//! # datastore-backup - Cloud Datastore export orchestrator
//!
//! datastore-backup exports every user kind of a Cloud Datastore namespace to
//! a Cloud Storage bucket using the managed export API.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Listing** namespaces and kinds through the `__namespace__` and `__kind__` metadata kinds
//! - **Batching** kinds into groups the export API accepts (at most 100 per request)
//! - **Exporting** each batch and polling the long-running operation to completion
//! - **Reporting** progress and the destination URL of every written batch
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (listing, batching, export invocation, coordination)
//! - [`adapters`] - External integrations (Cloud Datastore REST API)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datastore_backup::config::{build_config, ConfigOverrides};
//! use datastore_backup::core::backup::{BackupCoordinator, LogReporter};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let overrides = ConfigOverrides {
//!         project_id: Some("my-project".to_string()),
//!         bucket: Some("my-backups".to_string()),
//!         ..Default::default()
//!     };
//!     let config = build_config(None, &overrides)?;
//!
//!     let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!     let coordinator =
//!         BackupCoordinator::from_config(&config, Arc::new(LogReporter::new()), shutdown_rx)?;
//!
//!     let run = coordinator.execute_backup().await?;
//!     println!("Exported {} kinds in {} batches", run.kind_count, run.results.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Destinations
//!
//! Batch `i` of a run labelled `nightly` is written to
//! `gs://{bucket}/{dir}/nightly-{i}`. A batch holding a single kind gets the
//! kind name appended: `gs://{bucket}/{dir}/nightly-{i}/{kind}`.
//!
//! ```rust
//! use datastore_backup::core::backup::{destination_url, Batch};
//! use datastore_backup::domain::KindName;
//!
//! let batch = Batch::new(vec![KindName::new("Order").unwrap()]).unwrap();
//! assert_eq!(
//!     destination_url("my-backups", "bak", "nightly", 0, &batch),
//!     "gs://my-backups/bak/nightly-0/Order"
//! );
//! ```
//!
//! ## Error Handling
//!
//! Library errors are [`domain::BackupError`]. A failed run returns a
//! [`core::backup::RunFailure`] holding the error and the batches that
//! completed before it.
//!
//! ## Logging
//!
//! datastore-backup uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! use tracing::{info, warn};
//!
//! info!(batch_index = 0, destination = "gs://b/bak/r-0", "Exporting batch");
//! warn!(namespace = "tenant-a", "No kinds to export");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
