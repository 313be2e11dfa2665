//! Plugin runtime error types.

use crate::handshake::NOT_A_PLUGIN_MESSAGE;

/// Errors from serving a provider plugin.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// The magic cookie was missing or wrong, so no host launched this process.
    #[error("{}", NOT_A_PLUGIN_MESSAGE)]
    NotLaunchedByHost,

    /// The host and the plugin share no application protocol version.
    #[error("incompatible plugin protocol: host supports {host:?}, plugin supports {supported:?}")]
    IncompatibleProtocol {
        /// Versions advertised by the host.
        host: Vec<u32>,
        /// Versions this plugin can speak.
        supported: Vec<u32>,
    },

    /// Runtime configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// No listener could be bound.
    #[error("failed to bind listener: {0}")]
    Bind(String),

    /// The RPC server failed.
    #[error("rpc error: {0}")]
    Rpc(String),

    /// Installing a signal handler failed.
    #[error("signal handler error: {0}")]
    Signal(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for plugin runtime operations.
pub type PluginResult<T> = Result<T, PluginError>;
