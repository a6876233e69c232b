//! CLI command implementations
//!
//! Every command returns the process exit code.

pub mod backup;
pub mod namespaces;

use super::{Cli, EXIT_BACKUP_FAILED, EXIT_CONFIG_ERROR, EXIT_FATAL};
use crate::config::BackupConfig;
use crate::core::backup::InFlightExport;
use crate::domain::BackupError;
use tokio::sync::watch;

/// Runs the mode selected by the flags
pub async fn execute(
    cli: &Cli,
    config: BackupConfig,
    shutdown_signal: watch::Receiver<bool>,
    in_flight: InFlightExport,
) -> anyhow::Result<i32> {
    if cli.list_namespaces {
        namespaces::execute(&config).await
    } else if cli.dry_run {
        backup::execute_dry_run(&config).await
    } else {
        backup::execute(cli, &config, shutdown_signal, in_flight).await
    }
}

/// Exit code for an error raised outside a backup run
pub fn exit_code_for(error: &BackupError) -> i32 {
    match error {
        e if e.is_configuration() => EXIT_CONFIG_ERROR,
        BackupError::MetadataQuery(_)
        | BackupError::Export { .. }
        | BackupError::Remote { .. }
        | BackupError::Authentication(_)
        | BackupError::Connection(_) => EXIT_BACKUP_FAILED,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&BackupError::Configuration("x".to_string())),
            EXIT_CONFIG_ERROR
        );
        assert_eq!(
            exit_code_for(&BackupError::MetadataQuery("x".to_string())),
            EXIT_BACKUP_FAILED
        );
        assert_eq!(exit_code_for(&BackupError::export(2, "x")), EXIT_BACKUP_FAILED);
        assert_eq!(exit_code_for(&BackupError::Io("x".to_string())), EXIT_FATAL);
    }
}
