//! Graceful Shutdown Module
//!
//! SIGINT/SIGTERM flips a watch channel the server is subscribed to; tonic
//! then stops accepting connections and drains in-flight calls. Draining is
//! bounded by the configured shutdown timeout.

use std::future::Future;
use std::time::Duration;

use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Shutdown coordinator for graceful termination
#[derive(Debug)]
pub struct ShutdownCoordinator {
    shutdown_tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    /// Creates a new shutdown coordinator
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// Gets a shutdown receiver
    #[must_use]
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.shutdown_tx.subscribe(),
        }
    }

    /// Tell every subscriber to stop.
    pub fn trigger(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// True once [`Self::trigger`] has run.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        *self.shutdown_tx.borrow()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown signal receiver
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits for shutdown signal
    pub async fn recv(mut self) {
        // A dropped coordinator also counts as shutdown.
        let _ = self.receiver.wait_for(|stop| *stop).await;
    }

    /// Checks if shutdown has been signaled (non-blocking)
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Waits for SIGTERM or SIGINT
pub async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating shutdown");
        }
    }
}

/// Runs a server with graceful shutdown support.
///
/// `server_future` must have been built with a [`ShutdownSignal`] from
/// `coordinator` as its shutdown trigger.
///
/// # Errors
///
/// The server's own error, if it fails before or while draining.
pub async fn run_with_graceful_shutdown<F, E>(
    server_future: F,
    coordinator: ShutdownCoordinator,
    shutdown_timeout: Duration,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
{
    drive(server_future, coordinator, shutdown_timeout, wait_for_signal()).await
}

async fn drive<F, E, S>(
    server_future: F,
    coordinator: ShutdownCoordinator,
    shutdown_timeout: Duration,
    stop: S,
) -> Result<(), E>
where
    F: Future<Output = Result<(), E>>,
    S: Future<Output = ()>,
{
    let mut server_future = std::pin::pin!(server_future);

    tokio::select! {
        result = &mut server_future => {
            info!("Server stopped without a shutdown signal");
            return result;
        }
        () = stop => {
            info!("Shutdown signal received, draining in-flight calls");
            coordinator.trigger();
        }
    }

    if let Ok(result) = tokio::time::timeout(shutdown_timeout, server_future).await {
        info!("Shutdown complete");
        result
    } else {
        warn!(
            timeout_secs = shutdown_timeout.as_secs(),
            "Shutdown timeout reached, abandoning remaining calls"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_wakes_subscribers() {
        let coordinator = ShutdownCoordinator::new();
        let signal = coordinator.subscribe();
        assert!(!signal.is_shutdown());

        let waiter = tokio::spawn(signal.clone().recv());
        coordinator.trigger();
        waiter.await.unwrap();

        assert!(signal.is_shutdown());
        assert!(coordinator.is_triggered());
    }

    #[tokio::test]
    async fn test_server_error_is_returned() {
        let result = drive(
            async { Err::<(), _>("bind failed") },
            ShutdownCoordinator::new(),
            Duration::from_secs(1),
            std::future::pending(),
        )
        .await;
        assert_eq!(result, Err("bind failed"));
    }

    #[tokio::test]
    async fn test_stop_drains_server() {
        let coordinator = ShutdownCoordinator::new();
        let signal = coordinator.subscribe();
        let server = async move {
            signal.recv().await;
            Ok::<(), &str>(())
        };

        let result = drive(server, coordinator, Duration::from_secs(1), async {}).await;
        assert_eq!(result, Ok(()));
    }

    #[tokio::test]
    async fn test_drain_is_bounded() {
        let result = drive(
            std::future::pending::<Result<(), &str>>(),
            ShutdownCoordinator::new(),
            Duration::from_millis(20),
            async {},
        )
        .await;
        assert_eq!(result, Ok(()));
    }
}
