//! Run labels and destination paths

use super::batch::Batch;
use crate::domain::NamespaceName;
use chrono::{DateTime, Utc};

/// Timestamp layout of generated run labels (compact ISO-8601, UTC)
pub const LABEL_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Label used when no backup name is given:
/// `{timestamp}-{project}` or `{timestamp}-{project}:{namespace}`
pub fn default_run_label(
    now: DateTime<Utc>,
    project_id: &str,
    namespace: Option<&NamespaceName>,
) -> String {
    let timestamp = now.format(LABEL_TIMESTAMP_FORMAT);
    match namespace.filter(|ns| !ns.is_default()) {
        Some(ns) => format!("{timestamp}-{project_id}:{ns}"),
        None => format!("{timestamp}-{project_id}"),
    }
}

/// Joins path segments with `/`, dropping empty segments and redundant slashes
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|segment| segment.split('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Output URL prefix for one batch
///
/// Multi-kind batches write to `gs://{bucket}/{dir}/{label}-{index}`. A batch
/// holding a single kind gets the kind name appended as a further segment.
pub fn destination_url(
    bucket: &str,
    dir_prefix: &str,
    run_label: &str,
    batch_index: usize,
    batch: &Batch,
) -> String {
    let run_segment = format!("{run_label}-{batch_index}");
    let path = match batch.single_kind() {
        Some(kind) => join_path(&[bucket, dir_prefix, &run_segment, kind.as_str()]),
        None => join_path(&[bucket, dir_prefix, &run_segment]),
    };
    format!("gs://{path}")
}
