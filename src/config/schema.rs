//! Configuration schema types
//!
//! This module defines the configuration structure for datastore-backup.

use crate::config::SecretString;
use crate::core::backup::batch::BATCH_LIMIT;
use serde::{Deserialize, Serialize};

/// Main configuration
///
/// This is the root configuration structure that maps to the TOML file.
/// Every section is optional in the file; command-line arguments fill in
/// or override the rest before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Datastore connection settings
    #[serde(default)]
    pub datastore: DatastoreConfig,

    /// Backup destination and batching
    #[serde(default)]
    pub backup: BackupSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BackupConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.datastore.validate()?;
        self.backup.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Datastore connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatastoreConfig {
    /// Google Cloud project ID
    #[serde(default)]
    pub project_id: String,

    /// Namespace to back up (unset = default namespace)
    #[serde(default)]
    pub namespace: Option<String>,

    /// Base URL of the Datastore REST API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth2 access token
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Path to a credentials JSON file (defaults to GOOGLE_APPLICATION_CREDENTIALS)
    #[serde(default)]
    pub credentials_file: Option<String>,

    /// Skip authentication entirely (Datastore emulator)
    #[serde(default)]
    pub emulator: bool,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Interval between export operation polls in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl DatastoreConfig {
    fn validate(&self) -> Result<(), String> {
        if self.project_id.trim().is_empty() {
            return Err("datastore.project_id cannot be empty".to_string());
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err("datastore.base_url must start with http:// or https://".to_string());
        }

        if url::Url::parse(&self.base_url).is_err() {
            return Err(format!(
                "datastore.base_url is not a valid URL: {}",
                self.base_url
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("datastore.timeout_seconds must be > 0".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("datastore.poll_interval_ms must be > 0".to_string());
        }

        Ok(())
    }

    /// The namespace as a domain value, `None` for the default namespace
    pub fn namespace_name(&self) -> Option<crate::domain::NamespaceName> {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .map(crate::domain::NamespaceName::new)
    }
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            namespace: None,
            base_url: default_base_url(),
            access_token: None,
            credentials_file: None,
            emulator: false,
            timeout_seconds: default_timeout_seconds(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Backup destination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupSettings {
    /// Cloud Storage bucket receiving the export
    #[serde(default)]
    pub bucket: String,

    /// Prefix/directory inside the bucket
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Name of the backup (unset = generated from timestamp and project)
    #[serde(default)]
    pub backup_name: Option<String>,

    /// Kinds per export request (1-100)
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl BackupSettings {
    fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("backup.bucket cannot be empty".to_string());
        }

        if self.bucket.starts_with("gs://") {
            return Err(format!(
                "backup.bucket must be a bare bucket name, not a URL: {}",
                self.bucket
            ));
        }

        if self.bucket.contains('/') {
            return Err(format!(
                "backup.bucket must not contain '/': {}",
                self.bucket
            ));
        }

        if let Some(name) = &self.backup_name {
            if name.trim().is_empty() {
                return Err("backup.backup_name cannot be blank when set".to_string());
            }
        }

        if !(1..=BATCH_LIMIT).contains(&self.batch_size) {
            return Err(format!(
                "backup.batch_size must be between 1 and {BATCH_LIMIT}, got {}",
                self.batch_size
            ));
        }

        Ok(())
    }
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            backup_dir: default_backup_dir(),
            backup_name: None,
            batch_size: default_batch_size(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://datastore.googleapis.com".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_backup_dir() -> String {
    "bak".to_string()
}

fn default_batch_size() -> usize {
    BATCH_LIMIT
}

fn default_local_path() -> String {
    "/var/log/datastore-backup".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
