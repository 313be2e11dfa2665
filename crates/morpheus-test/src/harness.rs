//! Running a plugin server in the background for tests.

use std::net::SocketAddr;
use std::time::Duration;

use jsonrpsee::core::client::Error as ClientError;
use jsonrpsee::ws_client::{WsClient, WsClientBuilder};
use morpheus_plugin::{
    PluginError, PluginResult, PluginServer, ProviderFactory, RunOptions, ServeConfig, ServeOpts,
    ServeState, ShutdownReason,
};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::fixtures::host_config;

/// A plugin server running on a background task.
///
/// Signal and host watchers are disabled so tests control shutdown.
#[derive(Debug)]
pub struct RunningPlugin {
    addr: SocketAddr,
    app_version: u32,
    state: watch::Receiver<ServeState>,
    shutdown_tx: broadcast::Sender<ShutdownReason>,
    task: JoinHandle<PluginResult<ShutdownReason>>,
}

impl RunningPlugin {
    /// Serve `factory` with [`host_config`].
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub async fn start(factory: ProviderFactory) -> PluginResult<Self> {
        Self::start_with(&ServeOpts::new(factory), &host_config()).await
    }

    /// Serve with explicit options and host configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to start.
    pub async fn start_with(opts: &ServeOpts, config: &ServeConfig) -> PluginResult<Self> {
        let server = PluginServer::start(opts, config).await?;
        let addr = server.addr();
        let app_version = server.app_version();
        let state = server.subscribe_state();
        let shutdown_tx = server.shutdown_sender();

        let task = tokio::spawn(server.run(RunOptions {
            watch_signals: false,
            watch_host: false,
            ..RunOptions::default()
        }));

        Ok(Self {
            addr,
            app_version,
            state,
            shutdown_tx,
            task,
        })
    }

    /// Address the server listens on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Negotiated application protocol version.
    #[must_use]
    pub fn app_version(&self) -> u32 {
        self.app_version
    }

    /// `WebSocket` URL of the server.
    #[must_use]
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServeState {
        *self.state.borrow()
    }

    /// Connect a JSON-RPC client.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn client(&self) -> Result<WsClient, ClientError> {
        WsClientBuilder::default()
            .connection_timeout(Duration::from_secs(5))
            .build(self.url())
            .await
    }

    /// Trigger shutdown as if `reason` had happened.
    pub fn trigger(&self, reason: ShutdownReason) {
        // No receivers means the server already stopped.
        let _ = self.shutdown_tx.send(reason);
    }

    /// Wait for the server to finish.
    ///
    /// # Errors
    ///
    /// Returns the server's error, or an error if its task panicked.
    pub async fn wait(self) -> PluginResult<ShutdownReason> {
        self.task
            .await
            .map_err(|e| PluginError::Rpc(format!("server task failed: {e}")))?
    }

    /// Trigger `reason` and wait for the server to finish.
    ///
    /// # Errors
    ///
    /// See [`RunningPlugin::wait`].
    pub async fn stop(self, reason: ShutdownReason) -> PluginResult<ShutdownReason> {
        self.trigger(reason);
        self.wait().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use morpheus_plugin::Provider;

    use super::*;
    use crate::mocks::MockProvider;

    fn mock() -> &'static MockProvider {
        static MOCK: OnceLock<MockProvider> = OnceLock::new();
        MOCK.get_or_init(MockProvider::new)
    }

    fn factory() -> Box<dyn Provider> {
        Box::new(mock().clone())
    }

    #[tokio::test]
    async fn start_and_stop() {
        let plugin = RunningPlugin::start(factory).await.unwrap();
        assert_eq!(plugin.state(), ServeState::Serving);
        assert_eq!(plugin.app_version(), 6);
        assert!(plugin.url().starts_with("ws://127.0.0.1:"));

        let reason = plugin.stop(ShutdownReason::Terminated).await.unwrap();
        assert_eq!(reason, ShutdownReason::Terminated);
        assert_eq!(mock().stop_count(), 1);
    }
}
