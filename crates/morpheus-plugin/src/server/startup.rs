//! Server startup: handshake checks, listener binding, provider construction.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use jsonrpsee::server::Server;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info};

use super::rpc_impl::{ControllerRpcImpl, ProviderRpcImpl};
use super::{PluginServer, ServeState};
use crate::config::ServeConfig;
use crate::error::{PluginError, PluginResult};
use crate::handshake::{negotiate_version, verify_magic_cookie};
use crate::provider::{Provider, ServeOpts};
use crate::rpc::{ControllerRpcServer, ProviderRpcServer};

impl PluginServer {
    /// Validate the host handshake, bind the listener and start serving.
    ///
    /// The provider factory is called exactly once, after the handshake
    /// environment has been accepted and a listener is bound.
    ///
    /// # Errors
    ///
    /// Returns an error if the magic cookie is wrong (outside debug mode),
    /// no protocol version is shared with the host, the port range is
    /// invalid, or no listener can be bound.
    pub async fn start(opts: &ServeOpts, config: &ServeConfig) -> PluginResult<Self> {
        let (state_tx, _) = watch::channel(ServeState::NotServing);
        Self::start_with_state(opts, config, state_tx).await
    }

    /// [`start`](Self::start), publishing lifecycle changes on `state_tx`.
    ///
    /// `state_tx` is left untouched until the server is listening, so a
    /// receiver taken beforehand sees `NotServing` while startup runs and
    /// keeps seeing it if startup fails.
    ///
    /// # Errors
    ///
    /// See [`start`](Self::start).
    pub async fn start_with_state(
        opts: &ServeOpts,
        config: &ServeConfig,
        state_tx: watch::Sender<ServeState>,
    ) -> PluginResult<Self> {
        if opts.debug {
            debug!("Debug mode: skipping magic cookie check");
        } else {
            verify_magic_cookie(config)?;
        }

        let app_version = negotiate_version(config.protocol_versions.as_deref())?;

        let server = bind(config).await?;
        let addr = server
            .local_addr()
            .map_err(|e| PluginError::Bind(format!("failed to get address: {e}")))?;

        let provider: Arc<dyn Provider> = Arc::from((opts.provider_func)());

        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
        let shutting_down = Arc::new(AtomicBool::new(false));

        let mut module = ProviderRpcImpl {
            provider: Arc::clone(&provider),
            shutting_down: Arc::clone(&shutting_down),
        }
        .into_rpc();
        module
            .merge(
                ControllerRpcImpl {
                    shutdown_tx: shutdown_tx.clone(),
                    shutting_down: Arc::clone(&shutting_down),
                }
                .into_rpc(),
            )
            .map_err(|e| PluginError::Rpc(format!("failed to register controller: {e}")))?;

        let handle = server.start(module);
        state_tx.send_replace(ServeState::Serving);

        info!(addr = %addr, app_version, pid = std::process::id(), "Plugin server started");

        Ok(Self {
            provider,
            handle,
            addr,
            app_version,
            shutdown_tx,
            shutdown_rx,
            shutting_down,
            state_tx,
            started_at: Instant::now(),
        })
    }
}

/// Bind on loopback, honoring the host's port range if one is set.
async fn bind(config: &ServeConfig) -> PluginResult<Server> {
    let Some(range) = config.port_range()? else {
        return Server::builder()
            .build(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))
            .await
            .map_err(|e| PluginError::Bind(e.to_string()));
    };

    let (min, max) = (*range.start(), *range.end());
    for port in range {
        match Server::builder()
            .build(SocketAddr::from((Ipv4Addr::LOCALHOST, port)))
            .await
        {
            Ok(server) => return Ok(server),
            Err(e) => debug!(port, error = %e, "Port unavailable"),
        }
    }

    Err(PluginError::Bind(format!(
        "no free port in range {min}-{max}"
    )))
}
