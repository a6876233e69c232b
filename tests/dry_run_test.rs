//! Dry-run planning tests
//!
//! Planning lists kinds and computes destinations but must never submit an
//! export.

use datastore_backup::adapters::datastore::{DatastoreClient, NoAuth};
use datastore_backup::cli::commands::backup::render_plan;
use datastore_backup::config::BackupConfig;
use datastore_backup::core::backup::{BackupCoordinator, FixedClock, SilentReporter};
use chrono::{TimeZone, Utc};
use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::watch;

async fn planning_server(kinds: &[&str]) -> (mockito::ServerGuard, mockito::Mock) {
    let mut server = mockito::Server::new_async().await;
    let results: Vec<_> = kinds
        .iter()
        .map(|k| json!({"entity": {"key": {"path": [{"kind": "__kind__", "name": k}]}}}))
        .collect();

    server
        .mock("POST", "/v1/projects/proj1:runQuery")
        .with_status(200)
        .with_body(
            json!({"batch": {"entityResults": results, "moreResults": "NO_MORE_RESULTS"}})
                .to_string(),
        )
        .create_async()
        .await;

    let export = server
        .mock("POST", Matcher::Regex(r":export$".to_string()))
        .expect(0)
        .create_async()
        .await;

    (server, export)
}

fn coordinator(base_url: String, namespace: Option<&str>, batch_size: usize) -> BackupCoordinator {
    let mut config = BackupConfig::default();
    config.datastore.project_id = "proj1".to_string();
    config.datastore.base_url = base_url;
    config.datastore.namespace = namespace.map(str::to_string);
    config.backup.bucket = "b".to_string();
    config.backup.backup_dir = "nightly/".to_string();
    config.backup.batch_size = batch_size;

    let client =
        Arc::new(DatastoreClient::with_token_provider(&config.datastore, Arc::new(NoAuth)).unwrap());
    let (_tx, rx) = watch::channel(false);
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 2, 30, 0).unwrap());

    BackupCoordinator::new(client.clone(), client, &config, Arc::new(SilentReporter), rx)
        .with_clock(Arc::new(clock))
}

#[tokio::test]
async fn test_plan_does_not_export() {
    let (server, export) = planning_server(&["Order", "User", "__Stat_Total__", "Invoice"]).await;

    let plan = coordinator(server.url(), None, 2).plan().await.unwrap();

    assert_eq!(plan.backup_name, "20240301T023000-proj1");
    assert_eq!(plan.kinds.len(), 3);
    assert_eq!(plan.batches.len(), 2);
    assert_eq!(plan.batches[0].destination_url, "gs://b/nightly/20240301T023000-proj1-0");
    assert_eq!(
        plan.batches[1].destination_url,
        "gs://b/nightly/20240301T023000-proj1-1/Invoice"
    );
    export.assert_async().await;
}

#[tokio::test]
async fn test_plan_label_includes_namespace() {
    let (server, _export) = planning_server(&["Order"]).await;

    let plan = coordinator(server.url(), Some("tenant-a"), 100)
        .plan()
        .await
        .unwrap();

    assert_eq!(plan.backup_name, "20240301T023000-proj1:tenant-a");
    assert_eq!(plan.namespace.as_str(), "tenant-a");
}

#[tokio::test]
async fn test_render_plan_output() {
    let (server, _export) = planning_server(&["Order", "User"]).await;

    let plan = coordinator(server.url(), None, 100).plan().await.unwrap();
    let rendered = render_plan(&plan);

    assert!(rendered.starts_with("DRY RUN - nothing will be exported\n"));
    assert!(rendered.contains("Backup name: 20240301T023000-proj1\n"));
    assert!(rendered.contains("Namespace: (default)\n"));
    assert!(rendered.contains("Kinds: 2 in 1 batch(es)\n"));
    assert!(rendered.contains("  [0] gs://b/nightly/20240301T023000-proj1-0 <- Order, User\n"));
}

#[tokio::test]
async fn test_render_empty_plan() {
    let (server, _export) = planning_server(&[]).await;

    let plan = coordinator(server.url(), None, 100).plan().await.unwrap();

    assert!(plan.batches.is_empty());
    assert!(render_plan(&plan).contains("Kinds: 0 in 0 batch(es)\n"));
}
