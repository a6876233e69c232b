//! End-to-end backup runs against a mock Datastore REST API
//!
//! These tests drive the coordinator through the real HTTP client:
//! metadata listing, export submission and operation polling.

use datastore_backup::adapters::datastore::{DatastoreClient, NoAuth};
use datastore_backup::config::BackupConfig;
use datastore_backup::core::backup::{BackupCoordinator, RunState, SilentReporter};
use datastore_backup::domain::BackupError;
use mockito::{Matcher, Mock, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

fn test_config(base_url: String, batch_size: usize) -> BackupConfig {
    let mut config = BackupConfig::default();
    config.datastore.project_id = "proj1".to_string();
    config.datastore.base_url = base_url;
    config.datastore.poll_interval_ms = 1;
    config.backup.bucket = "b".to_string();
    config.backup.backup_name = Some("r".to_string());
    config.backup.batch_size = batch_size;
    config
}

fn coordinator(config: &BackupConfig) -> BackupCoordinator {
    let client =
        Arc::new(DatastoreClient::with_token_provider(&config.datastore, Arc::new(NoAuth)).unwrap());
    let (_tx, rx) = watch::channel(false);
    BackupCoordinator::new(client.clone(), client, config, Arc::new(SilentReporter), rx)
}

async fn mock_kinds(server: &mut ServerGuard, kinds: &[&str]) -> Mock {
    let results: Vec<_> = kinds
        .iter()
        .map(|k| json!({"entity": {"key": {"path": [{"kind": "__kind__", "name": k}]}}}))
        .collect();

    server
        .mock("POST", "/v1/projects/proj1:runQuery")
        .match_body(Matcher::PartialJson(
            json!({"query": {"kind": [{"name": "__kind__"}]}}),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"batch": {"entityResults": results, "moreResults": "NO_MORE_RESULTS"}})
                .to_string(),
        )
        .create_async()
        .await
}

async fn mock_export(server: &mut ServerGuard, prefix: &str, operation: &str) -> Mock {
    server
        .mock("POST", "/v1/projects/proj1:export")
        .match_body(Matcher::PartialJson(json!({"outputUrlPrefix": prefix})))
        .with_status(200)
        .with_body(
            json!({"name": format!("projects/proj1/operations/{operation}")}).to_string(),
        )
        .create_async()
        .await
}

async fn mock_operation_done(server: &mut ServerGuard, operation: &str, prefix: &str) -> Mock {
    server
        .mock("GET", format!("/v1/projects/proj1/operations/{operation}").as_str())
        .with_status(200)
        .with_body(
            json!({
                "name": format!("projects/proj1/operations/{operation}"),
                "done": true,
                "metadata": {
                    "common": {
                        "state": "SUCCESSFUL",
                        "startTime": "2024-01-01T10:00:00Z",
                        "endTime": "2024-01-01T10:00:12Z"
                    },
                    "progressEntities": {"workCompleted": "30"},
                    "progressBytes": {"workCompleted": "4096"},
                    "outputUrlPrefix": prefix
                }
            })
            .to_string(),
        )
        .create_async()
        .await
}

#[tokio::test]
async fn test_full_run_over_http() {
    let mut server = mockito::Server::new_async().await;
    let _kinds = mock_kinds(&mut server, &["Order", "_meta", "User", "Invoice"]).await;

    let export0 = mock_export(&mut server, "gs://b/bak/r-0", "op0").await;
    let export1 = mock_export(&mut server, "gs://b/bak/r-1/Invoice", "op1").await;
    let _op0 = mock_operation_done(&mut server, "op0", "gs://b/bak/r-0").await;
    let _op1 = mock_operation_done(&mut server, "op1", "gs://b/bak/r-1/Invoice").await;

    let config = test_config(server.url(), 2);
    let run = coordinator(&config).execute_backup().await.unwrap();

    assert_eq!(run.state, RunState::Done);
    assert_eq!(run.kind_count, 3);
    assert_eq!(
        run.destination_urls(),
        vec!["gs://b/bak/r-0", "gs://b/bak/r-1/Invoice"]
    );
    assert_eq!(run.total_entities(), 60);
    assert_eq!(run.results[0].elapsed_seconds, 12);

    export0.assert_async().await;
    export1.assert_async().await;
}

#[tokio::test]
async fn test_polls_running_operation_until_done() {
    let mut server = mockito::Server::new_async().await;
    let _kinds = mock_kinds(&mut server, &["Order"]).await;
    let _export = mock_export(&mut server, "gs://b/bak/r-0/Order", "op0").await;

    // Served first until it has been hit twice, then the finished operation
    let running = server
        .mock("GET", "/v1/projects/proj1/operations/op0")
        .with_status(200)
        .with_body(
            json!({
                "name": "projects/proj1/operations/op0",
                "metadata": {
                    "common": {"state": "PROCESSING"},
                    "progressBytes": {"workCompleted": "10", "workEstimated": "100"}
                }
            })
            .to_string(),
        )
        .expect(2)
        .create_async()
        .await;
    let _done = mock_operation_done(&mut server, "op0", "gs://b/bak/r-0/Order").await;

    let config = test_config(server.url(), 100);
    let run = coordinator(&config).execute_backup().await.unwrap();

    assert_eq!(run.destination_urls(), vec!["gs://b/bak/r-0/Order"]);
    running.assert_async().await;
}

#[tokio::test]
async fn test_second_batch_failure_stops_run() {
    let mut server = mockito::Server::new_async().await;
    let _kinds = mock_kinds(&mut server, &["A", "B", "C"]).await;

    let _export0 = mock_export(&mut server, "gs://b/bak/r-0/A", "op0").await;
    let _export1 = mock_export(&mut server, "gs://b/bak/r-1/B", "op1").await;
    let export2 = server
        .mock("POST", "/v1/projects/proj1:export")
        .match_body(Matcher::PartialJson(json!({"outputUrlPrefix": "gs://b/bak/r-2/C"})))
        .expect(0)
        .create_async()
        .await;

    let _op0 = mock_operation_done(&mut server, "op0", "gs://b/bak/r-0/A").await;
    let _op1 = server
        .mock("GET", "/v1/projects/proj1/operations/op1")
        .with_status(200)
        .with_body(
            json!({
                "name": "projects/proj1/operations/op1",
                "done": true,
                "error": {"code": 7, "message": "Bucket b is not writable"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = test_config(server.url(), 1);
    let failure = coordinator(&config).execute_backup().await.unwrap_err();

    match &failure.error {
        BackupError::Export {
            batch_index,
            message,
        } => {
            assert_eq!(*batch_index, 1);
            assert_eq!(message, "Bucket b is not writable");
        }
        other => panic!("expected export failure, got {other:?}"),
    }
    assert_eq!(failure.partial.destination_urls(), vec!["gs://b/bak/r-0/A"]);
    export2.assert_async().await;
}

#[tokio::test]
async fn test_metadata_failure_is_reported() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/projects/proj1:runQuery")
        .with_status(403)
        .with_body(
            json!({"error": {"code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED"}})
                .to_string(),
        )
        .create_async()
        .await;

    let config = test_config(server.url(), 100);
    let failure = coordinator(&config).execute_backup().await.unwrap_err();

    assert!(matches!(failure.error, BackupError::MetadataQuery(_)));
    assert!(failure.error.message().contains("insufficient permissions"));
    assert!(failure.partial.results.is_empty());
}

#[tokio::test]
async fn test_namespace_is_sent_with_queries_and_exports() {
    let mut server = mockito::Server::new_async().await;
    let query = server
        .mock("POST", "/v1/projects/proj1:runQuery")
        .match_body(Matcher::PartialJson(json!({
            "partitionId": {"namespaceId": "tenant-a"}
        })))
        .with_status(200)
        .with_body(
            json!({"batch": {
                "entityResults": [
                    {"entity": {"key": {"path": [{"kind": "__kind__", "name": "Order"}]}}}
                ],
                "moreResults": "NO_MORE_RESULTS"
            }})
            .to_string(),
        )
        .create_async()
        .await;
    let export = server
        .mock("POST", "/v1/projects/proj1:export")
        .match_body(Matcher::PartialJson(json!({
            "entityFilter": {"kinds": ["Order"], "namespaceIds": ["tenant-a"]}
        })))
        .with_status(200)
        .with_body(r#"{"name": "projects/proj1/operations/op0"}"#)
        .create_async()
        .await;
    let _op = mock_operation_done(&mut server, "op0", "gs://b/bak/r-0/Order").await;

    let mut config = test_config(server.url(), 100);
    config.datastore.namespace = Some("tenant-a".to_string());
    let run = coordinator(&config).execute_backup().await.unwrap();

    assert_eq!(run.results.len(), 1);
    query.assert_async().await;
    export.assert_async().await;
}
