//! Cloud Datastore adapter
//!
//! This module provides the integration with the Cloud Datastore REST API:
//! the service traits the backup core depends on, the wire models, the HTTP
//! client and its credential sources.

pub mod auth;
pub mod client;
pub mod models;
pub mod traits;

pub use auth::{token_provider_from_config, GoogleCredentials, NoAuth, StaticToken, TokenProvider};
pub use client::DatastoreClient;
pub use traits::{DatastoreAdmin, DatastoreQuery, EntityKey, OperationName, OperationStatus};
