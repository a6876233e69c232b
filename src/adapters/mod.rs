//! External system integrations for datastore-backup.
//!
//! - [`datastore`] - Cloud Datastore REST API (metadata queries, exports, operations)
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with fake implementations. The backup core only sees the
//! [`datastore::DatastoreQuery`] and [`datastore::DatastoreAdmin`] traits.
//!
//! ```rust,no_run
//! use datastore_backup::adapters::datastore::{DatastoreClient, DatastoreQuery};
//! use datastore_backup::config::DatastoreConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DatastoreConfig {
//!     project_id: "my-project".to_string(),
//!     ..Default::default()
//! };
//!
//! let client = DatastoreClient::new(&config)?;
//! let kinds = client.run_key_query("__kind__").await?;
//! println!("{} kinds", kinds.len());
//! # Ok(())
//! # }
//! ```

pub mod datastore;
