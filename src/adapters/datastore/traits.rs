//! Datastore service traits
//!
//! The backup core talks to Datastore only through these traits, so the REST
//! client can be swapped for an in-memory fake in tests.

use crate::domain::{ExportOutcome, ExportProgress, ExportRequest, Result};
use async_trait::async_trait;
use std::fmt;

/// Key of an entity returned by a keys-only query
///
/// Metadata entities are keyed by name, except the default namespace which
/// carries a numeric id instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
    pub name: Option<String>,
    pub id: Option<i64>,
}

impl EntityKey {
    /// Key with a name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            id: None,
        }
    }

    /// Key with a numeric id
    pub fn with_id(id: i64) -> Self {
        Self { name: None, id: Some(id) }
    }
}

/// Fully-qualified name of a long-running operation
/// (`projects/{project}/operations/{id}`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationName(String);

impl OperationName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State of an export operation at one poll
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    /// Still running; carries the latest progress snapshot
    Running(ExportProgress),
    /// Finished successfully
    Succeeded(ExportOutcome),
    /// Finished with an error; carries the service message
    Failed(String),
}

/// Read-only query access, bound to one project and namespace
#[async_trait]
pub trait DatastoreQuery: Send + Sync {
    /// Runs a keys-only query over `kind` and returns every key, following
    /// result pages until the query is exhausted
    async fn run_key_query(&self, kind: &str) -> Result<Vec<EntityKey>>;
}

/// Admin (export) access
#[async_trait]
pub trait DatastoreAdmin: Send + Sync {
    /// Submits an export; returns as soon as the operation is accepted
    async fn start_export(&self, request: &ExportRequest) -> Result<OperationName>;

    /// Fetches the current state of an operation
    async fn get_operation(&self, operation: &OperationName) -> Result<OperationStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_key_constructors() {
        assert_eq!(EntityKey::named("Order").name.as_deref(), Some("Order"));
        assert_eq!(EntityKey::with_id(1).id, Some(1));
    }

    #[test]
    fn test_operation_name_display() {
        let name = OperationName::new("projects/p/operations/abc");
        assert_eq!(name.to_string(), "projects/p/operations/abc");
    }
}
