//! Shutdown signal handling.

use tokio::signal;
use tracing::{info, warn};

/// Completes when the process is asked to stop.
///
/// Passed to `StashMonitor::run` as its shutdown future.
///
/// # Platform Support
///
/// * **Unix platforms**: Handles SIGINT and SIGTERM signals, falling back to
///   Ctrl+C if either handler cannot be installed
/// * **Other platforms**: Handles Ctrl+C
///
/// If no signal can be listened for at all, the future never completes and
/// the process runs until killed.
///
/// # Example
///
/// ```rust,ignore
/// let stats = monitor.run(signals::shutdown_signal()).await?;
/// ```
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("📡 Received SIGINT"),
                    _ = sigterm.recv() => info!("📡 Received SIGTERM"),
                }
                return;
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("Failed to install Unix signal handlers, using Ctrl+C only: {}", e);
            }
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("📡 Received Ctrl+C"),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C, running until killed: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
