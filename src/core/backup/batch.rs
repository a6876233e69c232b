//! Kind batching
//!
//! The export API accepts at most [`BATCH_LIMIT`] kinds per request, so the
//! kind list is cut into consecutive, order-preserving batches.

use crate::domain::{BackupError, KindName, Result};
use std::fmt;

/// Maximum number of kinds a single export request may name
pub const BATCH_LIMIT: usize = 100;

/// A non-empty, ordered group of kinds exported by one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    kinds: Vec<KindName>,
}

impl Batch {
    /// Creates a batch; `None` for an empty list or one longer than
    /// [`BATCH_LIMIT`]
    pub fn new(kinds: Vec<KindName>) -> Option<Self> {
        if kinds.is_empty() || kinds.len() > BATCH_LIMIT {
            None
        } else {
            Some(Self { kinds })
        }
    }

    pub fn kinds(&self) -> &[KindName] {
        &self.kinds
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Never true for a constructed batch
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// The kind, when the batch holds exactly one
    pub fn single_kind(&self) -> Option<&KindName> {
        match self.kinds.as_slice() {
            [kind] => Some(kind),
            _ => None,
        }
    }

}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.single_kind() {
            Some(kind) => write!(f, "{kind}"),
            None => write!(f, "{} kinds", self.kinds.len()),
        }
    }
}

/// Splits `kinds` into consecutive batches of at most `limit` kinds
///
/// Concatenating the batches yields `kinds` unchanged; every batch but the
/// last holds exactly `limit` kinds.
///
/// # Errors
///
/// Returns a validation error when `limit` is zero or above [`BATCH_LIMIT`].
pub fn split_into_batches(kinds: &[KindName], limit: usize) -> Result<Vec<Batch>> {
    if !(1..=BATCH_LIMIT).contains(&limit) {
        return Err(BackupError::Validation(format!(
            "batch limit must be between 1 and {BATCH_LIMIT}, got {limit}"
        )));
    }

    Ok(kinds
        .chunks(limit)
        .map(|chunk| Batch {
            kinds: chunk.to_vec(),
        })
        .collect())
}
