//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Configuration is layered, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional TOML file (with `${VAR}` substitution)
//! 3. `DATASTORE_BACKUP_*` environment variables
//! 4. Command-line arguments

use super::schema::BackupConfig;
use super::secret::secret_string;
use crate::domain::errors::BackupError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Environment variable pointing at a running Datastore emulator
pub const EMULATOR_HOST_ENV: &str = "DATASTORE_EMULATOR_HOST";

/// Values supplied on the command line
///
/// `None` leaves the lower layers untouched.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Datastore project ID
    pub project_id: Option<String>,
    /// Destination bucket
    pub bucket: Option<String>,
    /// Prefix/directory within the bucket
    pub backup_dir: Option<String>,
    /// Explicit backup name
    pub backup_name: Option<String>,
    /// Datastore namespace
    pub namespace: Option<String>,
}

impl ConfigOverrides {
    fn apply(&self, config: &mut BackupConfig) {
        if let Some(project_id) = &self.project_id {
            config.datastore.project_id = project_id.clone();
        }
        if let Some(bucket) = &self.bucket {
            config.backup.bucket = bucket.clone();
        }
        if let Some(backup_dir) = &self.backup_dir {
            config.backup.backup_dir = backup_dir.clone();
        }
        if let Some(backup_name) = &self.backup_name {
            config.backup.backup_name = Some(backup_name.clone());
        }
        if let Some(namespace) = &self.namespace {
            config.datastore.namespace = Some(namespace.clone());
        }
    }
}

/// Loads and validates configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into BackupConfig
/// 4. Applies environment variable overrides (DATASTORE_BACKUP_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file is missing or unreadable, TOML parsing fails,
/// a referenced environment variable is unset, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use datastore_backup::config::loader::load_config;
///
/// let config = load_config("datastore-backup.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<BackupConfig> {
    build_config(Some(path.as_ref()), &ConfigOverrides::default())
}

/// Builds the effective configuration from all layers and validates it
///
/// With no file, the configuration starts from defaults.
pub fn build_config(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<BackupConfig> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => BackupConfig::default(),
    };

    apply_env_overrides(&mut config);
    overrides.apply(&mut config);

    config.validate().map_err(|e| {
        BackupError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Reads and parses a TOML configuration file without validating it
fn read_config_file(path: &Path) -> Result<BackupConfig> {
    if !path.exists() {
        return Err(BackupError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BackupError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    toml::from_str(&contents)
        .map_err(|e| BackupError::Configuration(format!("Failed to parse TOML: {e}")))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| BackupError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut lines = Vec::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            lines.push(line.to_string());
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        lines.push(processed_line);
    }

    if !missing_vars.is_empty() {
        return Err(BackupError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

/// Applies environment variable overrides using the DATASTORE_BACKUP_* prefix
///
/// Environment variables follow the pattern DATASTORE_BACKUP_<SECTION>_<KEY>,
/// for example DATASTORE_BACKUP_BACKUP_BUCKET. `DATASTORE_EMULATOR_HOST`
/// switches the client to an unauthenticated emulator.
fn apply_env_overrides(config: &mut BackupConfig) {
    // Datastore overrides
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_DATASTORE_PROJECT_ID") {
        config.datastore.project_id = val;
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_DATASTORE_NAMESPACE") {
        config.datastore.namespace = Some(val);
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_DATASTORE_BASE_URL") {
        config.datastore.base_url = val;
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_ACCESS_TOKEN") {
        config.datastore.access_token = Some(secret_string(val));
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_DATASTORE_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.datastore.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_DATASTORE_POLL_INTERVAL_MS") {
        if let Ok(interval) = val.parse() {
            config.datastore.poll_interval_ms = interval;
        }
    }
    if let Ok(host) = std::env::var(EMULATOR_HOST_ENV) {
        if !host.is_empty() {
            config.datastore.base_url = if host.starts_with("http") {
                host
            } else {
                format!("http://{host}")
            };
            config.datastore.emulator = true;
        }
    }

    // Backup overrides
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_BACKUP_BUCKET") {
        config.backup.bucket = val;
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_BACKUP_DIR") {
        config.backup.backup_dir = val;
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_BACKUP_BATCH_SIZE") {
        if let Ok(size) = val.parse() {
            config.backup.batch_size = size;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("DATASTORE_BACKUP_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
