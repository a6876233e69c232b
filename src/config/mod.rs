//! Configuration management for datastore-backup.
//!
//! Most runs need no configuration file at all: the project ID and bucket come
//! from the command line and credentials from the environment. A TOML file can
//! supply the same settings plus the tunables that have no flag.
//!
//! # Example Configuration
//!
//! ```toml
//! [datastore]
//! project_id = "my-project"
//! namespace = "tenant-a"
//! access_token = "${DATASTORE_TOKEN}"
//! poll_interval_ms = 5000
//!
//! [backup]
//! bucket = "my-backups"
//! backup_dir = "bak"
//! batch_size = 100
//!
//! [logging]
//! local_enabled = true
//! local_path = "/var/log/datastore-backup"
//! ```
//!
//! `${VAR_NAME}` placeholders are replaced from the environment before parsing,
//! and `DATASTORE_BACKUP_<SECTION>_<KEY>` variables override file values.
//!
//! ```rust,no_run
//! use datastore_backup::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("datastore-backup.toml")?;
//! println!("Backing up {} to gs://{}", config.datastore.project_id, config.backup.bucket);
//! # Ok(())
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{build_config, load_config, ConfigOverrides};
pub use schema::{BackupConfig, BackupSettings, DatastoreConfig, LoggingConfig};
pub use secret::{secret_string, SecretString, SecretValue};
