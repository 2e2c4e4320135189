//! Shutdown signal handling.
//!
//! SIGTERM and SIGINT (Ctrl+C elsewhere) cancel a shared
//! [`CancellationToken`]. The HTTP server drains on it and in-flight
//! calendar fetches abort with a service error.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Process-wide shutdown trigger.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    cancel: CancellationToken,
}

impl ShutdownSignal {
    /// Creates a new, untriggered shutdown signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token cancelled on shutdown.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Triggers shutdown.
    pub fn trigger(&self) {
        self.cancel.cancel();
    }

    /// Completes when shutdown is triggered.
    pub async fn wait(self) {
        self.cancel.cancelled().await;
    }

    /// Spawns the OS signal listener task.
    ///
    /// Call once at server startup.
    #[cfg(unix)]
    pub fn spawn_listener(&self) {
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            use tokio::signal::unix::{SignalKind, signal};

            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(s) => Some(s),
                Err(e) => {
                    warn!("failed to install SIGTERM handler: {}", e);
                    None
                }
            };

            let terminate = async {
                match sigterm.as_mut() {
                    Some(s) => {
                        s.recv().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = terminate => info!("Received SIGTERM, initiating shutdown"),
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => info!("Received SIGINT, initiating shutdown"),
                    Err(e) => warn!("failed to listen for SIGINT: {}", e),
                },
                _ = cancel.cancelled() => {}
            }

            cancel.cancel();
            debug!("Signal listener stopped");
        });
    }

    /// Non-Unix implementation: Ctrl+C only.
    #[cfg(not(unix))]
    pub fn spawn_listener(&self) {
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => info!("Received Ctrl+C, initiating shutdown"),
                    Err(e) => warn!("failed to listen for Ctrl+C: {}", e),
                },
                _ = cancel.cancelled() => {}
            }
            cancel.cancel();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_cancels_token() {
        let signal = ShutdownSignal::new();
        let token = signal.token();
        assert!(!token.is_cancelled());

        signal.trigger();
        assert!(token.is_cancelled());
        assert!(signal.token().is_cancelled());
    }

    #[tokio::test]
    async fn wait_completes_after_trigger() {
        let signal = ShutdownSignal::new();
        let waiter = tokio::spawn(signal.clone().wait());

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait should complete")
            .unwrap();
    }

    #[tokio::test]
    async fn listener_stops_on_trigger() {
        let signal = ShutdownSignal::new();
        signal.spawn_listener();
        signal.trigger();
        assert!(signal.token().is_cancelled());
    }
}
