//! Export request and result types
//!
//! These are the typed shapes exchanged between the backup core and the
//! Datastore admin API. Remote fields that may be absent are `Option`s here;
//! nothing is accessed optimistically.

use super::ids::{KindName, NamespaceName};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One export request, built once per batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    output_url_prefix: String,
    kinds: Vec<KindName>,
    namespace: NamespaceName,
}

impl ExportRequest {
    /// Create a new export request
    pub fn new(output_url_prefix: String, kinds: Vec<KindName>, namespace: NamespaceName) -> Self {
        Self {
            output_url_prefix,
            kinds,
            namespace,
        }
    }

    /// Destination prefix (`gs://bucket/...`)
    pub fn output_url_prefix(&self) -> &str {
        &self.output_url_prefix
    }

    /// Kinds to export
    pub fn kinds(&self) -> &[KindName] {
        &self.kinds
    }

    /// Namespace to export from
    pub fn namespace(&self) -> &NamespaceName {
        &self.namespace
    }
}

/// Progress snapshot of a running export
///
/// Estimates may be provisional and can move while the export runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportProgress {
    /// Bytes written so far
    pub bytes_completed: u64,
    /// Estimated total bytes
    pub bytes_estimated: u64,
    /// Entities written so far
    pub entities_completed: u64,
    /// Estimated total entities
    pub entities_estimated: u64,
}

impl ExportProgress {
    /// Byte progress as a percentage, `None` while there is no estimate
    pub fn percent(&self) -> Option<f64> {
        if self.bytes_estimated == 0 {
            return None;
        }
        Some(self.bytes_completed as f64 / self.bytes_estimated as f64 * 100.0)
    }
}

/// Terminal data of a successful export operation, as reported by the service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportOutcome {
    /// Output URL reported by the service
    pub output_url: Option<String>,
    /// Final counters
    pub progress: ExportProgress,
    /// Service-side start time
    pub start_time: Option<DateTime<Utc>>,
    /// Service-side end time
    pub end_time: Option<DateTime<Utc>>,
}

impl ExportOutcome {
    /// Elapsed whole seconds between start and end, 0 when either is unknown
    pub fn elapsed_seconds(&self) -> u64 {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                let secs = end.timestamp() - start.timestamp();
                secs.max(0) as u64
            }
            _ => 0,
        }
    }
}

/// Result of one successfully completed batch export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportResult {
    /// Index of the batch within the run
    pub batch_index: usize,
    /// Kinds contained in the batch
    pub kinds: Vec<KindName>,
    /// Destination URL actually used by the service
    pub destination_url: String,
    /// Total bytes transferred
    pub bytes_transferred: u64,
    /// Total entities transferred
    pub entities_transferred: u64,
    /// Elapsed wall-clock seconds (service timestamps)
    pub elapsed_seconds: u64,
}
