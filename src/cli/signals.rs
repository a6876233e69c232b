//! Shutdown signal handling
//!
//! The first SIGINT/SIGTERM asks the run to stop after the batch in flight.
//! A second one stops waiting altogether; the export operation keeps running
//! on the service side.

use crate::core::backup::InFlightExport;
use tokio::sync::{mpsc, watch};

/// Resolves on the next SIGINT or SIGTERM
///
/// Never resolves if no signal handler can be installed.
pub async fn os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C)");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM");
                    }
                }
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to create SIGTERM handler, listening for Ctrl+C only");
            }
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received SIGINT (Ctrl+C)"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Forwards the first signal to `shutdown` and returns on the second
///
/// The returned message names the operation that was still being awaited.
pub async fn escalate(
    mut signals: mpsc::Receiver<()>,
    shutdown: watch::Sender<bool>,
    in_flight: InFlightExport,
) -> String {
    if signals.recv().await.is_none() {
        std::future::pending::<()>().await;
    }
    eprintln!(
        "\nShutdown signal received, waiting for the current export to finish \
         (signal again to stop waiting)..."
    );
    let _ = shutdown.send(true);

    if signals.recv().await.is_none() {
        std::future::pending::<()>().await;
    }

    match in_flight.current() {
        Some(operation) => format!(
            "Stopped waiting for export operation {operation}; it continues on the server"
        ),
        None => "Stopped".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::datastore::OperationName;
    use crate::core::backup::ProgressReporter;

    #[tokio::test]
    async fn test_first_signal_requests_shutdown() {
        let (signal_tx, signal_rx) = mpsc::channel(4);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(escalate(signal_rx, shutdown_tx, InFlightExport::new()));

        signal_tx.send(()).await.unwrap();
        shutdown_rx.changed().await.unwrap();
        assert!(*shutdown_rx.borrow());
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn test_second_signal_names_in_flight_operation() {
        let (signal_tx, signal_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let in_flight = InFlightExport::new();
        in_flight.export_submitted(2, &OperationName::new("projects/p/operations/op2"));

        signal_tx.send(()).await.unwrap();
        signal_tx.send(()).await.unwrap();
        let message = escalate(signal_rx, shutdown_tx, in_flight).await;

        assert!(*shutdown_rx.borrow());
        assert!(message.contains("projects/p/operations/op2"));
    }

    #[tokio::test]
    async fn test_second_signal_without_export() {
        let (signal_tx, signal_rx) = mpsc::channel(4);
        let (shutdown_tx, _shutdown_rx) = watch::channel(false);

        signal_tx.send(()).await.unwrap();
        signal_tx.send(()).await.unwrap();

        assert_eq!(
            escalate(signal_rx, shutdown_tx, InFlightExport::new()).await,
            "Stopped"
        );
    }
}
