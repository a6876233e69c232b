//! Metadata listing
//!
//! Namespaces and kinds are discovered through the `__namespace__` and
//! `__kind__` metadata kinds with keys-only queries.

use crate::adapters::datastore::{DatastoreQuery, EntityKey};
use crate::domain::{BackupError, KindName, NamespaceName, Result};
use std::sync::Arc;

/// Metadata kind enumerating namespaces
pub const NAMESPACE_META_KIND: &str = "__namespace__";

/// Metadata kind enumerating kinds of the current namespace
pub const KIND_META_KIND: &str = "__kind__";

/// Lists namespaces and user kinds of the bound project and namespace
#[derive(Clone)]
pub struct MetadataLister {
    query: Arc<dyn DatastoreQuery>,
}

impl MetadataLister {
    pub fn new(query: Arc<dyn DatastoreQuery>) -> Self {
        Self { query }
    }

    /// All namespaces of the project
    ///
    /// The default namespace's key carries an id instead of a name and is
    /// returned as the empty namespace.
    pub async fn list_namespaces(&self) -> Result<Vec<NamespaceName>> {
        let keys = self.meta_keys(NAMESPACE_META_KIND).await?;

        let namespaces: Vec<NamespaceName> = keys
            .into_iter()
            .map(|key| NamespaceName::new(key.name.unwrap_or_default()))
            .collect();

        tracing::debug!(count = namespaces.len(), "Listed namespaces");
        Ok(namespaces)
    }

    /// User kinds of the current namespace, in service order
    ///
    /// Names starting with `_` are reserved (statistics and metadata kinds)
    /// and never exported.
    pub async fn list_kind_names(&self) -> Result<Vec<KindName>> {
        let keys = self.meta_keys(KIND_META_KIND).await?;
        let total = keys.len();

        let kinds: Vec<KindName> = keys
            .into_iter()
            .filter_map(|key| key.name)
            .filter_map(|name| KindName::new(name).ok())
            .filter(|kind| !kind.is_reserved())
            .collect();

        tracing::debug!(
            count = kinds.len(),
            skipped = total - kinds.len(),
            "Listed kinds"
        );
        Ok(kinds)
    }

    async fn meta_keys(&self, meta_kind: &str) -> Result<Vec<EntityKey>> {
        self.query.run_key_query(meta_kind).await.map_err(|e| {
            BackupError::MetadataQuery(format!("{meta_kind} query failed: {}", e.message()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeQuery {
        results: HashMap<String, Vec<EntityKey>>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeQuery {
        fn with(mut self, kind: &str, keys: Vec<EntityKey>) -> Self {
            self.results.insert(kind.to_string(), keys);
            self
        }
    }

    #[async_trait]
    impl DatastoreQuery for FakeQuery {
        async fn run_key_query(&self, kind: &str) -> Result<Vec<EntityKey>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BackupError::Remote {
                    status: 403,
                    message: "Missing or insufficient permissions.".to_string(),
                });
            }
            Ok(self.results.get(kind).cloned().unwrap_or_default())
        }
    }

    fn named(names: &[&str]) -> Vec<EntityKey> {
        names.iter().map(|n| EntityKey::named(*n)).collect()
    }

    #[tokio::test]
    async fn test_reserved_kinds_filtered() {
        let fake = FakeQuery::default().with(
            KIND_META_KIND,
            named(&["Order", "_meta", "User", "_Stats"]),
        );
        let lister = MetadataLister::new(Arc::new(fake));

        let kinds = lister.list_kind_names().await.unwrap();
        let names: Vec<&str> = kinds.iter().map(KindName::as_str).collect();
        assert_eq!(names, vec!["Order", "User"]);
    }

    #[tokio::test]
    async fn test_statistics_kinds_filtered() {
        let fake = FakeQuery::default().with(
            KIND_META_KIND,
            named(&["__Stat_Total__", "__Stat_Kind__", "Customer"]),
        );
        let kinds = MetadataLister::new(Arc::new(fake))
            .list_kind_names()
            .await
            .unwrap();
        assert_eq!(kinds, vec![KindName::new("Customer").unwrap()]);
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() {
        let fake = Arc::new(FakeQuery::default().with(KIND_META_KIND, named(&["B", "A", "C"])));
        let lister = MetadataLister::new(fake.clone());

        let first = lister.list_kind_names().await.unwrap();
        let second = lister.list_kind_names().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_store() {
        let lister = MetadataLister::new(Arc::new(FakeQuery::default()));
        assert!(lister.list_kind_names().await.unwrap().is_empty());
        assert!(lister.list_namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_namespace_maps_to_empty() {
        let fake = FakeQuery::default().with(
            NAMESPACE_META_KIND,
            vec![EntityKey::with_id(1), EntityKey::named("ns1")],
        );
        let namespaces = MetadataLister::new(Arc::new(fake))
            .list_namespaces()
            .await
            .unwrap();

        assert_eq!(namespaces.len(), 2);
        assert!(namespaces[0].is_default());
        assert_eq!(namespaces[1].as_str(), "ns1");
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let fake = FakeQuery {
            fail: true,
            ..Default::default()
        };
        let err = MetadataLister::new(Arc::new(fake))
            .list_kind_names()
            .await
            .unwrap_err();

        match err {
            BackupError::MetadataQuery(message) => {
                assert!(message.contains("insufficient permissions"));
                assert!(message.contains(KIND_META_KIND));
            }
            other => panic!("expected metadata query failure, got {other:?}"),
        }
    }
}
