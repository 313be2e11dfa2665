//! The plugin RPC server and its lifecycle.

mod lifecycle;
mod rpc_impl;
mod startup;
mod watchers;

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

use jsonrpsee::server::ServerHandle;
use tokio::sync::{broadcast, watch};

use crate::handshake::HandshakeLine;
use crate::provider::Provider;

pub use lifecycle::RunOptions;

/// Lifecycle state of a served plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeState {
    /// The server has not started listening yet.
    NotServing,
    /// The server is listening and dispatching host calls.
    Serving,
    /// The server has stopped. Terminal.
    Terminated,
}

impl fmt::Display for ServeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotServing => "not_serving",
            Self::Serving => "serving",
            Self::Terminated => "terminated",
        })
    }
}

/// Why a plugin stopped serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The host called `plugin_shutdown`.
    HostRequested,
    /// The host process went away.
    HostExited,
    /// The process received a termination signal.
    Terminated,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HostRequested => "host requested shutdown",
            Self::HostExited => "host process exited",
            Self::Terminated => "termination signal",
        })
    }
}

/// A running plugin server.
///
/// Created by [`PluginServer::start`], driven to completion by
/// [`PluginServer::run`].
pub struct PluginServer {
    /// The one provider instance built from the factory.
    provider: Arc<dyn Provider>,
    /// Handle of the jsonrpsee server.
    handle: ServerHandle,
    /// Address the server listens on.
    addr: SocketAddr,
    /// Negotiated application protocol version.
    app_version: u32,
    /// Shutdown requests from the controller RPC and watchers.
    shutdown_tx: broadcast::Sender<ShutdownReason>,
    /// Receiver subscribed before the server started, so no request is lost.
    shutdown_rx: broadcast::Receiver<ShutdownReason>,
    /// Set once shutdown begins; provider calls are refused afterwards.
    shutting_down: Arc<AtomicBool>,
    /// Lifecycle state.
    state_tx: watch::Sender<ServeState>,
    /// When the server started.
    started_at: Instant,
}

impl PluginServer {
    /// Address the RPC server listens on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Negotiated application protocol version.
    #[must_use]
    pub fn app_version(&self) -> u32 {
        self.app_version
    }

    /// The line to announce this server to the host.
    #[must_use]
    pub fn handshake(&self) -> HandshakeLine {
        HandshakeLine::new(self.app_version, self.addr)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ServeState {
        *self.state_tx.borrow()
    }

    /// Watch lifecycle state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<ServeState> {
        self.state_tx.subscribe()
    }

    /// Sender that triggers shutdown of this server.
    #[must_use]
    pub fn shutdown_sender(&self) -> broadcast::Sender<ShutdownReason> {
        self.shutdown_tx.clone()
    }
}

impl fmt::Debug for PluginServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginServer")
            .field("addr", &self.addr)
            .field("app_version", &self.app_version)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
