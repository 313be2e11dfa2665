//! Serving until told to stop, then shutting down cleanly.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::watchers;
use super::{PluginServer, ServeState, ShutdownReason};
use crate::error::PluginResult;

/// Options for [`PluginServer::run`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Install SIGTERM / Ctrl-C handling.
    pub watch_signals: bool,
    /// Exit when the host process goes away.
    pub watch_host: bool,
    /// How often to check the host process.
    pub host_check_interval: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            watch_signals: true,
            watch_host: true,
            host_check_interval: Duration::from_secs(1),
        }
    }
}

impl PluginServer {
    /// Serve until a shutdown trigger fires, then shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if a signal handler cannot be installed.
    pub async fn run(mut self, options: RunOptions) -> PluginResult<ShutdownReason> {
        let signal_watcher = if options.watch_signals {
            Some(watchers::spawn_signal_watcher(self.shutdown_tx.clone())?)
        } else {
            None
        };
        let host_watcher = if options.watch_host {
            watchers::spawn_host_watcher(self.shutdown_tx.clone(), options.host_check_interval)
        } else {
            None
        };

        let reason = loop {
            match self.shutdown_rx.recv().await {
                Ok(reason) => break reason,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed shutdown notifications");
                },
                // Unreachable while `self` holds a sender.
                Err(RecvError::Closed) => break ShutdownReason::Terminated,
            }
        };

        for watcher in [signal_watcher, host_watcher].into_iter().flatten() {
            watcher.abort();
        }

        info!(%reason, uptime_secs = self.started_at.elapsed().as_secs(), "Plugin shutting down");
        self.shutdown().await;
        Ok(reason)
    }

    /// Stop the provider and the RPC server and wait until both are done.
    pub async fn shutdown(self) {
        self.shutting_down.store(true, Ordering::Release);

        if let Err(e) = self.provider.stop().await {
            warn!(error = %e, "Provider failed to stop during shutdown");
        }

        // Already stopped is fine: the handle only errors on a second stop.
        let _ = self.handle.stop();
        self.handle.clone().stopped().await;

        self.state_tx.send_replace(ServeState::Terminated);
        info!("Plugin server stopped");
    }
}
