//! Domain error types
//!
//! This module defines the error hierarchy for datastore-backup.
//! Errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main backup error type
///
/// This is the primary error type used throughout the application.
/// Every failure of a backup run surfaces as one of these variants.
#[derive(Debug, Error)]
pub enum BackupError {
    /// Invalid or missing configuration, detected before any remote call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Listing namespaces or kinds failed
    #[error("Metadata query failed: {0}")]
    MetadataQuery(String),

    /// One batch's export operation failed
    #[error("Export of batch {batch_index} failed: {message}")]
    Export {
        /// Index of the batch whose export failed
        batch_index: usize,
        /// Message reported by the remote service
        message: String,
    },

    /// Authentication errors (token acquisition, rejected credentials)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Network/connection errors
    #[error("Connection error: {0}")]
    Connection(String),

    /// The remote service answered with an error status
    #[error("Remote error: {status} - {message}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl BackupError {
    /// Creates an export failure for the given batch
    pub fn export(batch_index: usize, message: impl Into<String>) -> Self {
        BackupError::Export {
            batch_index,
            message: message.into(),
        }
    }

    /// Returns the bare message without the variant prefix
    ///
    /// Remote failures are reported to the user with the message the
    /// service produced, not with our own wording around it.
    pub fn message(&self) -> String {
        match self {
            BackupError::Export { message, .. } => message.clone(),
            BackupError::Remote { message, .. } => message.clone(),
            BackupError::Configuration(m)
            | BackupError::MetadataQuery(m)
            | BackupError::Authentication(m)
            | BackupError::Connection(m)
            | BackupError::Validation(m)
            | BackupError::Serialization(m)
            | BackupError::Io(m) => m.clone(),
        }
    }

    /// Whether this error was detected before talking to the service
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            BackupError::Configuration(_) | BackupError::Validation(_)
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        BackupError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        BackupError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BackupError {
    fn from(err: toml::de::Error) -> Self {
        BackupError::Configuration(format!("TOML parse error: {err}"))
    }
}
