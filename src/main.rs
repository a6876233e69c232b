// datastore-backup - Cloud Datastore export orchestrator
// Copyright (c) 2025 datastore-backup Contributors
// Licensed under the MIT License

use clap::Parser;
use datastore_backup::cli::{
    commands, signals, Cli, EXIT_CONFIG_ERROR, EXIT_FATAL, EXIT_INTERRUPTED,
};
use datastore_backup::core::backup::InFlightExport;
use datastore_backup::logging::init_logging;
use std::process;
use tokio::sync::{mpsc, watch};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Configuration errors are reported before anything touches the network
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e.message());
            process::exit(EXIT_CONFIG_ERROR);
        }
    };

    let logging_guard = match init_logging(&cli.log_level, &config.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "datastore-backup - Cloud Datastore export orchestrator"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let in_flight = InFlightExport::new();

    let (signal_tx, signal_rx) = mpsc::channel(4);
    tokio::spawn(async move {
        loop {
            signals::os_signal().await;
            if signal_tx.send(()).await.is_err() {
                break;
            }
        }
    });

    // A second signal abandons the wait for the export in flight
    let watcher_in_flight = in_flight.clone();
    tokio::spawn(async move {
        let message = signals::escalate(signal_rx, shutdown_tx, watcher_in_flight).await;
        tracing::warn!("{message}");
        eprintln!("{message}");
        process::exit(EXIT_INTERRUPTED);
    });

    let exit_code = match commands::execute(&cli, config, shutdown_rx, in_flight).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    drop(logging_guard);
    process::exit(exit_code);
}
