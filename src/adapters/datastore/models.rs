//! Cloud Datastore REST v1 wire models
//!
//! Request and response bodies for `projects.runQuery`, `projects.export` and
//! `projects.operations.get`. Only the fields this tool reads are modelled.
//! int64 values are JSON strings on the wire; they are accepted as either
//! strings or numbers.

use super::traits::{EntityKey, OperationStatus};
use crate::domain::{ExportOutcome, ExportProgress, ExportRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Key property used to build keys-only projections
pub const KEY_PROPERTY: &str = "__key__";

/// Operation state reported for a finished, successful export
pub const STATE_SUCCESSFUL: &str = "SUCCESSFUL";

/// Query batch marker meaning more results can be fetched with the end cursor
pub const MORE_RESULTS_NOT_FINISHED: &str = "NOT_FINISHED";

// ---------------------------------------------------------------------------
// runQuery
// ---------------------------------------------------------------------------

/// `projects.runQuery` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    pub partition_id: PartitionId,
    pub query: Query,
}

impl RunQueryRequest {
    /// Keys-only query over a single kind
    pub fn keys_only(
        project_id: &str,
        namespace_id: &str,
        kind: &str,
        start_cursor: Option<String>,
    ) -> Self {
        Self {
            partition_id: PartitionId {
                project_id: project_id.to_string(),
                namespace_id: namespace_id.to_string(),
            },
            query: Query {
                kind: vec![KindExpression {
                    name: kind.to_string(),
                }],
                projection: vec![Projection {
                    property: PropertyReference {
                        name: KEY_PROPERTY.to_string(),
                    },
                }],
                start_cursor,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionId {
    pub project_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    pub kind: Vec<KindExpression>,
    pub projection: Vec<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KindExpression {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Projection {
    pub property: PropertyReference,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyReference {
    pub name: String,
}

/// `projects.runQuery` response body
#[derive(Debug, Clone, Deserialize)]
pub struct RunQueryResponse {
    pub batch: QueryResultBatch,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResultBatch {
    #[serde(default)]
    pub entity_results: Vec<EntityResult>,
    #[serde(default)]
    pub more_results: Option<String>,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

impl QueryResultBatch {
    /// Whether another page must be requested from `end_cursor`
    pub fn has_more(&self) -> bool {
        self.more_results.as_deref() == Some(MORE_RESULTS_NOT_FINISHED) && self.end_cursor.is_some()
    }

    /// Keys of the returned entities; the last path element identifies the entity
    pub fn keys(&self) -> Vec<EntityKey> {
        self.entity_results
            .iter()
            .filter_map(|result| result.entity.key.as_ref())
            .filter_map(|key| key.path.last())
            .map(|element| EntityKey {
                name: element.name.clone(),
                id: element.id,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityResult {
    pub entity: Entity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub key: Option<Key>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Key {
    #[serde(default)]
    pub path: Vec<PathElement>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathElement {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "int64_opt")]
    pub id: Option<i64>,
}

// ---------------------------------------------------------------------------
// export / operations
// ---------------------------------------------------------------------------

/// `projects.export` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntitiesRequest {
    pub output_url_prefix: String,
    pub entity_filter: EntityFilter,
}

impl From<&ExportRequest> for ExportEntitiesRequest {
    fn from(request: &ExportRequest) -> Self {
        Self {
            output_url_prefix: request.output_url_prefix().to_string(),
            entity_filter: EntityFilter {
                kinds: request
                    .kinds()
                    .iter()
                    .map(|kind| kind.as_str().to_string())
                    .collect(),
                namespace_ids: vec![request.namespace().as_str().to_string()],
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityFilter {
    pub kinds: Vec<String>,
    pub namespace_ids: Vec<String>,
}

/// Long-running operation as returned by `export` and `operations.get`
#[derive(Debug, Clone, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub metadata: Option<ExportEntitiesMetadata>,
    #[serde(default)]
    pub error: Option<Status>,
    #[serde(default)]
    pub response: Option<ExportEntitiesResponse>,
}

impl Operation {
    /// Progress counters from the metadata, zero where absent
    pub fn progress(&self) -> ExportProgress {
        let metadata = self.metadata.as_ref();
        let bytes = metadata.and_then(|m| m.progress_bytes.as_ref());
        let entities = metadata.and_then(|m| m.progress_entities.as_ref());
        ExportProgress {
            bytes_completed: bytes.and_then(|p| p.work_completed).unwrap_or(0),
            bytes_estimated: bytes.and_then(|p| p.work_estimated).unwrap_or(0),
            entities_completed: entities.and_then(|p| p.work_completed).unwrap_or(0),
            entities_estimated: entities.and_then(|p| p.work_estimated).unwrap_or(0),
        }
    }

    /// Translates the operation into the typed status the core consumes
    pub fn status(&self) -> OperationStatus {
        if !self.done {
            return OperationStatus::Running(self.progress());
        }

        if let Some(error) = &self.error {
            return OperationStatus::Failed(error.describe());
        }

        let common = self.metadata.as_ref().and_then(|m| m.common.as_ref());
        if let Some(state) = common.and_then(|c| c.state.as_deref()) {
            if state != STATE_SUCCESSFUL {
                return OperationStatus::Failed(format!(
                    "export operation {} finished in state {state}",
                    self.name
                ));
            }
        }

        OperationStatus::Succeeded(ExportOutcome {
            output_url: self
                .response
                .as_ref()
                .and_then(|r| r.output_url.clone())
                .or_else(|| {
                    self.metadata
                        .as_ref()
                        .and_then(|m| m.output_url_prefix.clone())
                }),
            progress: self.progress(),
            start_time: common.and_then(|c| c.start_time),
            end_time: common.and_then(|c| c.end_time),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntitiesMetadata {
    #[serde(default)]
    pub common: Option<CommonMetadata>,
    #[serde(default)]
    pub progress_entities: Option<Progress>,
    #[serde(default)]
    pub progress_bytes: Option<Progress>,
    #[serde(default)]
    pub output_url_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonMetadata {
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default, deserialize_with = "int64_opt")]
    pub work_completed: Option<u64>,
    #[serde(default, deserialize_with = "int64_opt")]
    pub work_estimated: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntitiesResponse {
    #[serde(default)]
    pub output_url: Option<String>,
}

/// `google.rpc.Status`, used both in operations and in HTTP error bodies
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Status {
    /// The service message, or the code when the message is missing
    pub fn describe(&self) -> String {
        match (&self.message, self.code) {
            (Some(message), _) if !message.is_empty() => message.clone(),
            (_, Some(code)) => format!("operation failed with code {code}"),
            _ => "operation failed without an error message".to_string(),
        }
    }
}

/// Error envelope of a non-2xx Google API response
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    pub error: Status,
}

/// Accepts int64 as a JSON string or number
fn int64_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + TryFrom<u64>,
    <T as FromStr>::Err: std::fmt::Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Text(text)) => text.parse().map(Some).map_err(serde::de::Error::custom),
        Some(Repr::Number(number)) => T::try_from(number)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("integer out of range: {number}"))),
    }
}
