//! Core business logic for datastore-backup.
//!
//! # Modules
//!
//! - [`backup`] - Metadata listing, batching, export invocation and run coordination
//!
//! # Backup Workflow
//!
//! 1. **Label**: Use the given backup name or generate `{timestamp}-{project}[:{namespace}]`
//! 2. **List**: Query `__kind__` for the user kinds of the namespace
//! 3. **Batch**: Split the kinds into groups of at most 100
//! 4. **Export**: Submit one export per batch and poll it to completion, in order
//! 5. **Report**: Log the summary and print the written destinations
//!
//! # Example
//!
//! ```rust,no_run
//! use datastore_backup::config::load_config;
//! use datastore_backup::core::backup::{BackupCoordinator, LogReporter};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("datastore-backup.toml")?;
//!
//! // Create shutdown signal
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let coordinator =
//!     BackupCoordinator::from_config(&config, Arc::new(LogReporter::new()), shutdown_rx)?;
//!
//! let run = coordinator.execute_backup().await?;
//! for url in run.destination_urls() {
//!     println!("{url}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod backup;
