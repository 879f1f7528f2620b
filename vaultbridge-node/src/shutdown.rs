//! Graceful shutdown coordination.

use tokio::sync::broadcast;

/// Shutdown signal sender.
pub type ShutdownTx = broadcast::Sender<()>;

/// Shutdown signal receiver.
pub type ShutdownRx = broadcast::Receiver<()>;

/// Create a shutdown channel.
pub fn shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    broadcast::channel(1)
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
///
/// If the handlers cannot be installed this never returns; the node then
/// stops only through its own shutdown channel.
pub async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let (mut sigint, mut sigterm) =
            match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
                (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!(error = %e, "failed to install signal handlers");
                    return std::future::pending().await;
                }
            };

        tokio::select! {
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, initiating shutdown...");
            }
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            return std::future::pending().await;
        }
        tracing::info!("Received Ctrl+C, initiating shutdown...");
    }
}

/// A guard that holds a shutdown receiver and can check for shutdown.
pub struct ShutdownGuard {
    rx: ShutdownRx,
}

impl ShutdownGuard {
    /// Create a new shutdown guard from a sender.
    pub fn new(tx: &ShutdownTx) -> Self {
        Self { rx: tx.subscribe() }
    }

    /// Wait for the shutdown signal.
    pub async fn wait(&mut self) {
        let _ = self.rx.recv().await;
    }

    /// Check if shutdown has been signaled (non-blocking).
    pub fn is_shutdown(&mut self) -> bool {
        matches!(self.rx.try_recv(), Ok(_) | Err(broadcast::error::TryRecvError::Closed))
    }
}
