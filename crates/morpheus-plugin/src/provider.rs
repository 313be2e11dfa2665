//! Provider trait and the options handed to [`serve`](crate::serve).

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{Diagnostic, ProviderSchema};

/// Registry address reported in reattach instructions when none is given.
pub const DEFAULT_PROVIDER_ADDR: &str = "registry.terraform.io/gomorpheus/morpheus";

/// A provider implementation served to the host.
///
/// The runtime wraps the instance in an `Arc` and calls it concurrently from
/// RPC handlers, so implementations keep mutable state behind their own locks.
#[async_trait]
pub trait Provider: Send + Sync {
    /// The provider's schema.
    fn schema(&self) -> ProviderSchema;

    /// Check a provider configuration without applying it.
    async fn validate_config(&self, config: &Value) -> Vec<Diagnostic>;

    /// Apply a provider configuration.
    ///
    /// Returning any error diagnostic leaves the provider unconfigured.
    async fn configure(&self, config: Value) -> Vec<Diagnostic>;

    /// Cancel in-flight work. Called by the host and on shutdown.
    ///
    /// # Errors
    ///
    /// Returns a message describing why the provider could not stop cleanly.
    async fn stop(&self) -> Result<(), String>;
}

/// Zero-argument constructor for a provider instance.
pub type ProviderFactory = fn() -> Box<dyn Provider>;

/// Options for [`serve`](crate::serve).
#[derive(Clone)]
pub struct ServeOpts {
    /// Constructor for the provider. Called exactly once.
    pub provider_func: ProviderFactory,
    /// Registry address of the provider, used in reattach instructions.
    pub provider_addr: String,
    /// Start in reattach mode instead of waiting for a host handshake.
    pub debug: bool,
}

impl ServeOpts {
    /// Options serving the given factory with default settings.
    #[must_use]
    pub fn new(provider_func: ProviderFactory) -> Self {
        Self {
            provider_func,
            provider_addr: DEFAULT_PROVIDER_ADDR.to_string(),
            debug: false,
        }
    }

    /// Set the provider's registry address.
    #[must_use]
    pub fn with_provider_addr(mut self, addr: impl Into<String>) -> Self {
        self.provider_addr = addr.into();
        self
    }

    /// Toggle reattach (debug) mode.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl fmt::Debug for ServeOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServeOpts")
            .field("provider_addr", &self.provider_addr)
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}
