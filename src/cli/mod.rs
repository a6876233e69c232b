//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for datastore-backup using clap.

pub mod commands;
pub mod signals;
pub mod spinner;

use crate::config::{build_config, BackupConfig, ConfigOverrides};
use crate::domain::Result;
use clap::{ArgAction, Parser};
use std::path::Path;

/// Exit code of a successful run
pub const EXIT_OK: i32 = 0;
/// Exit code of a failed backup (metadata query or export failure)
pub const EXIT_BACKUP_FAILED: i32 = 1;
/// Exit code of a configuration error, detected before any remote call
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Exit code of any other fatal error
pub const EXIT_FATAL: i32 = 5;
/// Exit code after a shutdown signal
pub const EXIT_INTERRUPTED: i32 = 130;

/// Back up a Cloud Datastore namespace to Cloud Storage
#[derive(Parser, Debug)]
#[command(name = "datastore-backup")]
#[command(version, about, long_about = None, disable_version_flag = true)]
#[command(after_help = "Please provide `GOOGLE_APPLICATION_CREDENTIALS` via the Environment!")]
pub struct Cli {
    /// Google Cloud project ID
    pub project_id: Option<String>,

    /// Destination Cloud Storage bucket (bare name)
    pub bucket: Option<String>,

    /// Prefix/directory inside the bucket [default: bak]
    #[arg(short = 'd', long, visible_alias = "backupDir")]
    pub backup_dir: Option<String>,

    /// Name of the backup [default: <timestamp>-<project>[:<namespace>]]
    #[arg(short = 'n', long, visible_alias = "backupName")]
    pub backup_name: Option<String>,

    /// Namespace to back up [default: the default namespace]
    #[arg(short = 's', long)]
    pub namespace: Option<String>,

    /// Path to an optional configuration file
    #[arg(short, long, env = "DATASTORE_BACKUP_CONFIG")]
    pub config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DATASTORE_BACKUP_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// List kinds and planned destinations without exporting
    #[arg(long)]
    pub dry_run: bool,

    /// Print the namespaces of the project and exit
    #[arg(long, conflicts_with = "dry_run")]
    pub list_namespaces: bool,

    /// Suppress the progress spinner
    #[arg(short, long)]
    pub quiet: bool,

    /// Print version
    #[arg(short = 'v', long, action = ArgAction::Version)]
    pub version: Option<bool>,
}

impl Cli {
    /// Command-line values layered over file and environment configuration
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            project_id: self.project_id.clone(),
            bucket: self.bucket.clone(),
            backup_dir: self.backup_dir.clone(),
            backup_name: self.backup_name.clone(),
            namespace: self.namespace.clone(),
        }
    }

    /// Builds and validates the effective configuration
    ///
    /// Listing namespaces needs no destination, so the bucket check is
    /// satisfied with a placeholder in that mode.
    pub fn resolve_config(&self) -> Result<BackupConfig> {
        let mut overrides = self.overrides();
        if self.list_namespaces && overrides.bucket.is_none() {
            overrides.bucket = Some(commands::namespaces::UNUSED_BUCKET.to_string());
        }
        build_config(self.config.as_deref().map(Path::new), &overrides)
    }
}
