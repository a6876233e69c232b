//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output on stderr
//! - Configurable log levels (`--log-level` or `RUST_LOG`)
//! - Local JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use datastore_backup::logging::init_logging;
//! use datastore_backup::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(batch_index = 0, "Exporting batch");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a batch export
///
/// # Example
///
/// ```no_run
/// use datastore_backup::log_batch_processing;
///
/// log_batch_processing!(0, 3, "gs://bucket/bak/nightly-0");
/// ```
#[macro_export]
macro_rules! log_batch_processing {
    ($batch_index:expr, $total:expr, $destination:expr) => {
        tracing::info!(
            batch_index = $batch_index,
            total_batches = $total,
            destination = %$destination,
            "Exporting batch"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use datastore_backup::log_error_with_context;
/// use datastore_backup::domain::BackupError;
///
/// let error = BackupError::Configuration("bucket is required".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}
