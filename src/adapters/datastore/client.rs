//! Cloud Datastore REST client
//!
//! A thin `reqwest` client over the three endpoints the backup needs. It is
//! bound to one project and namespace at construction; there is no global
//! client state.

use super::auth::{token_provider_from_config, TokenProvider};
use super::models::{
    ErrorResponse, ExportEntitiesRequest, Operation, RunQueryRequest, RunQueryResponse,
};
use super::traits::{DatastoreAdmin, DatastoreQuery, EntityKey, OperationName, OperationStatus};
use crate::config::DatastoreConfig;
use crate::domain::{BackupError, ExportRequest, NamespaceName, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// REST client for one Datastore project and namespace
pub struct DatastoreClient {
    /// Base URL without trailing slash
    base_url: String,
    project_id: String,
    namespace: NamespaceName,
    http: Client,
    auth: Arc<dyn TokenProvider>,
}

impl DatastoreClient {
    /// Creates a client, resolving credentials from the configuration and
    /// environment
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built or the
    /// configured key file cannot be loaded.
    pub fn new(config: &DatastoreConfig) -> Result<Self> {
        let http = build_http_client(config)?;
        let auth = token_provider_from_config(config)?;
        Ok(Self::from_parts(config, http, auth))
    }

    /// Creates a client with an explicit token provider
    pub fn with_token_provider(
        config: &DatastoreConfig,
        auth: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let http = build_http_client(config)?;
        Ok(Self::from_parts(config, http, auth))
    }

    fn from_parts(config: &DatastoreConfig, http: Client, auth: Arc<dyn TokenProvider>) -> Self {
        tracing::debug!(
            base_url = %config.base_url,
            project_id = %config.project_id,
            auth = auth.kind(),
            "Created Datastore client"
        );

        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            namespace: config.namespace_name().unwrap_or_default(),
            http,
            auth,
        }
    }

    fn project_url(&self, method: &str) -> String {
        format!("{}/v1/projects/{}:{method}", self.base_url, self.project_id)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match self.auth.authorization().await? {
            Some(header) => request.header(reqwest::header::AUTHORIZATION, header),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| BackupError::Connection(e.to_string()))?;

        parse_response(response).await
    }

    async fn run_query_page(&self, kind: &str, cursor: Option<String>) -> Result<RunQueryResponse> {
        let body = RunQueryRequest::keys_only(
            &self.project_id,
            self.namespace.as_str(),
            kind,
            cursor,
        );
        self.send(self.http.post(self.project_url("runQuery")).json(&body))
            .await
    }
}

fn build_http_client(config: &DatastoreConfig) -> Result<Client> {
    ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| BackupError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Decodes a success body, or maps an error status to a domain error carrying
/// the service's message
async fn parse_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| BackupError::Serialization(format!("Invalid response body: {e}")));
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .ok()
        .and_then(|e| e.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));

    if status == StatusCode::UNAUTHORIZED {
        return Err(BackupError::Authentication(message));
    }

    Err(BackupError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl DatastoreQuery for DatastoreClient {
    async fn run_key_query(&self, kind: &str) -> Result<Vec<EntityKey>> {
        let mut keys = Vec::new();
        let mut cursor = None;

        loop {
            let page = self.run_query_page(kind, cursor.take()).await?;
            keys.extend(page.batch.keys());

            if !page.batch.has_more() {
                break;
            }

            tracing::debug!(kind = %kind, fetched = keys.len(), "Fetching next query page");
            cursor = page.batch.end_cursor;
        }

        Ok(keys)
    }
}

#[async_trait]
impl DatastoreAdmin for DatastoreClient {
    async fn start_export(&self, request: &ExportRequest) -> Result<OperationName> {
        let body = ExportEntitiesRequest::from(request);

        tracing::debug!(
            destination = %request.output_url_prefix(),
            kinds = request.kinds().len(),
            "Submitting export"
        );

        let operation: Operation = self
            .send(self.http.post(self.project_url("export")).json(&body))
            .await?;

        if operation.name.is_empty() {
            return Err(BackupError::Serialization(
                "Export response did not include an operation name".to_string(),
            ));
        }

        Ok(OperationName::new(operation.name))
    }

    async fn get_operation(&self, operation: &OperationName) -> Result<OperationStatus> {
        let url = format!("{}/v1/{}", self.base_url, operation.as_str());
        let operation: Operation = self.send(self.http.get(url)).await?;
        Ok(operation.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::datastore::auth::{NoAuth, StaticToken};
    use crate::config::secret_string;
    use crate::domain::KindName;
    use mockito::Matcher;
    use serde_json::json;

    fn test_config(base_url: String) -> DatastoreConfig {
        DatastoreConfig {
            project_id: "proj1".to_string(),
            base_url,
            ..Default::default()
        }
    }

    fn client(base_url: String) -> DatastoreClient {
        DatastoreClient::with_token_provider(&test_config(base_url), Arc::new(NoAuth)).unwrap()
    }

    #[tokio::test]
    async fn test_run_key_query_follows_cursor() {
        let mut server = mockito::Server::new_async().await;

        let first = server
            .mock("POST", "/v1/projects/proj1:runQuery")
            .match_body(Matcher::Json(json!({
                "partitionId": {"projectId": "proj1"},
                "query": {
                    "kind": [{"name": "__kind__"}],
                    "projection": [{"property": {"name": "__key__"}}]
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"batch": {
                    "entityResults": [
                        {"entity": {"key": {"path": [{"kind": "__kind__", "name": "Order"}]}}}
                    ],
                    "moreResults": "NOT_FINISHED",
                    "endCursor": "page2"
                }})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let second = server
            .mock("POST", "/v1/projects/proj1:runQuery")
            .match_body(Matcher::PartialJson(json!({"query": {"startCursor": "page2"}})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"batch": {
                    "entityResults": [
                        {"entity": {"key": {"path": [{"kind": "__kind__", "name": "User"}]}}}
                    ],
                    "moreResults": "NO_MORE_RESULTS",
                    "endCursor": "page3"
                }})
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let keys = client(server.url()).run_key_query("__kind__").await.unwrap();

        assert_eq!(keys, vec![EntityKey::named("Order"), EntityKey::named("User")]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_sends_namespace_and_bearer_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/projects/proj1:runQuery")
            .match_header("authorization", "Bearer ya29.test")
            .match_body(Matcher::PartialJson(json!({
                "partitionId": {"projectId": "proj1", "namespaceId": "ns1"}
            })))
            .with_status(200)
            .with_body(r#"{"batch": {"moreResults": "NO_MORE_RESULTS"}}"#)
            .create_async()
            .await;

        let mut config = test_config(server.url());
        config.namespace = Some("ns1".to_string());
        let client = DatastoreClient::with_token_provider(
            &config,
            Arc::new(StaticToken::new(secret_string("ya29.test".to_string()))),
        )
        .unwrap();

        let keys = client.run_key_query("__kind__").await.unwrap();
        assert!(keys.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_remote_error_carries_google_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/proj1:runQuery")
            .with_status(403)
            .with_body(
                json!({"error": {
                    "code": 403,
                    "message": "Missing or insufficient permissions.",
                    "status": "PERMISSION_DENIED"
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let err = client(server.url()).run_key_query("__kind__").await.unwrap_err();
        match err {
            BackupError::Remote { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing or insufficient permissions.");
            }
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_authentication() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/proj1:runQuery")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let err = client(server.url()).run_key_query("__kind__").await.unwrap_err();
        assert!(matches!(err, BackupError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_start_export_returns_operation_name() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/projects/proj1:export")
            .match_body(Matcher::Json(json!({
                "outputUrlPrefix": "gs://b/bak/r-0/Order",
                "entityFilter": {"kinds": ["Order"], "namespaceIds": [""]}
            })))
            .with_status(200)
            .with_body(
                json!({
                    "name": "projects/proj1/operations/op-1",
                    "metadata": {"common": {"state": "PROCESSING"}}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let request = ExportRequest::new(
            "gs://b/bak/r-0/Order".to_string(),
            vec![KindName::new("Order").unwrap()],
            NamespaceName::default(),
        );
        let name = client(server.url()).start_export(&request).await.unwrap();

        assert_eq!(name.as_str(), "projects/proj1/operations/op-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_start_export_without_name_fails() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/projects/proj1:export")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let request = ExportRequest::new(
            "gs://b/bak/r-0".to_string(),
            vec![KindName::new("Order").unwrap()],
            NamespaceName::default(),
        );
        let err = client(server.url()).start_export(&request).await.unwrap_err();
        assert!(matches!(err, BackupError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_get_operation_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/v1/projects/proj1/operations/op-1")
            .with_status(200)
            .with_body(
                json!({
                    "name": "projects/proj1/operations/op-1",
                    "done": true,
                    "metadata": {
                        "common": {"state": "SUCCESSFUL"},
                        "progressEntities": {"workCompleted": "12"},
                        "outputUrlPrefix": "gs://b/bak/r-0"
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let status = client(server.url())
            .get_operation(&OperationName::new("projects/proj1/operations/op-1"))
            .await
            .unwrap();

        match status {
            OperationStatus::Succeeded(outcome) => {
                assert_eq!(outcome.output_url.as_deref(), Some("gs://b/bak/r-0"));
                assert_eq!(outcome.progress.entities_completed, 12);
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_error() {
        // Nothing listens on the discard port
        let err = client("http://127.0.0.1:9".to_string())
            .run_key_query("__kind__")
            .await
            .unwrap_err();
        assert!(matches!(err, BackupError::Connection(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = client("http://localhost:8081/".to_string());
        assert_eq!(
            client.project_url("export"),
            "http://localhost:8081/v1/projects/proj1:export"
        );
    }
}
