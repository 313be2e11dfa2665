//! JSON-RPC API spoken between the host and the plugin.
//!
//! Uses jsonrpsee proc macros to define the RPC interface. The plugin
//! implements the server side; hosts (and tests) use the generated clients.

use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use serde_json::Value;

use crate::types::{Diagnostic, ProviderSchema};

/// Provider protocol, forwarded to the served [`Provider`](crate::Provider).
#[rpc(server, client, namespace = "provider")]
pub trait ProviderRpc {
    /// Return the provider's schema.
    #[method(name = "getSchema")]
    async fn get_schema(&self) -> Result<ProviderSchema, ErrorObjectOwned>;

    /// Validate a provider configuration without applying it.
    #[method(name = "validateConfig")]
    async fn validate_config(&self, config: Value) -> Result<Vec<Diagnostic>, ErrorObjectOwned>;

    /// Configure the provider.
    #[method(name = "configure")]
    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ErrorObjectOwned>;

    /// Ask the provider to cancel in-flight work. Returns the failure
    /// message, if any.
    #[method(name = "stop")]
    async fn stop(&self) -> Result<Option<String>, ErrorObjectOwned>;
}

/// Plugin controller, used by the host to end the plugin process.
#[rpc(server, client, namespace = "plugin")]
pub trait ControllerRpc {
    /// Shut the plugin down.
    #[method(name = "shutdown")]
    async fn shutdown(&self) -> Result<(), ErrorObjectOwned>;
}

/// Custom error codes for plugin RPC errors.
pub mod error_codes {
    /// The plugin is shutting down and no longer accepts calls.
    pub const SHUTTING_DOWN: i32 = -32010;
}
