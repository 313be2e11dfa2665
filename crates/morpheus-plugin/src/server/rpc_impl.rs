//! RPC handlers: the provider protocol and the plugin controller.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use jsonrpsee::types::ErrorObjectOwned;
use morpheus_telemetry::{RequestContext, RequestGuard};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::{Instrument, debug, info, warn};

use super::ShutdownReason;
use crate::provider::Provider;
use crate::rpc::{ControllerRpcServer, ProviderRpcServer, error_codes};
use crate::types::{Diagnostic, ProviderSchema, has_errors};

/// Forwards provider protocol calls to the served provider.
pub(super) struct ProviderRpcImpl {
    pub(super) provider: Arc<dyn Provider>,
    pub(super) shutting_down: Arc<AtomicBool>,
}

impl ProviderRpcImpl {
    fn ensure_running(&self) -> Result<(), ErrorObjectOwned> {
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(ErrorObjectOwned::owned(
                error_codes::SHUTTING_DOWN,
                "plugin is shutting down",
                None::<()>,
            ));
        }
        Ok(())
    }
}

/// Run `fut` inside a request span and log its duration.
async fn traced<T>(operation: &'static str, fut: impl Future<Output = T>) -> T {
    let ctx = RequestContext::new("provider", operation);
    let span = ctx.span();
    async move {
        debug!("Request started");
        let out = fut.await;
        debug!(elapsed_ms = ctx.elapsed_ms(), "Request completed");
        out
    }
    .instrument(span)
    .await
}

#[jsonrpsee::core::async_trait]
impl ProviderRpcServer for ProviderRpcImpl {
    async fn get_schema(&self) -> Result<ProviderSchema, ErrorObjectOwned> {
        self.ensure_running()?;
        traced("getSchema", async { Ok(self.provider.schema()) }).await
    }

    async fn validate_config(&self, config: Value) -> Result<Vec<Diagnostic>, ErrorObjectOwned> {
        self.ensure_running()?;
        traced("validateConfig", async {
            let diagnostics = self.provider.validate_config(&config).await;
            debug!(count = diagnostics.len(), "Validated provider config");
            Ok(diagnostics)
        })
        .await
    }

    async fn configure(&self, config: Value) -> Result<Vec<Diagnostic>, ErrorObjectOwned> {
        self.ensure_running()?;
        traced("configure", async {
            let diagnostics = self.provider.configure(config).await;
            if has_errors(&diagnostics) {
                warn!(count = diagnostics.len(), "Provider configuration rejected");
            } else {
                info!("Provider configured");
            }
            Ok(diagnostics)
        })
        .await
    }

    async fn stop(&self) -> Result<Option<String>, ErrorObjectOwned> {
        traced("stop", async {
            let result = self.provider.stop().await;
            if let Err(e) = &result {
                warn!(error = %e, "Provider failed to stop");
            }
            Ok(result.err())
        })
        .await
    }
}

/// Handles host requests to end the plugin.
pub(super) struct ControllerRpcImpl {
    pub(super) shutdown_tx: broadcast::Sender<ShutdownReason>,
    pub(super) shutting_down: Arc<AtomicBool>,
}

#[jsonrpsee::core::async_trait]
impl ControllerRpcServer for ControllerRpcImpl {
    async fn shutdown(&self) -> Result<(), ErrorObjectOwned> {
        let _guard = RequestGuard::new(RequestContext::new("plugin", "shutdown"));
        self.shutting_down.store(true, Ordering::Release);
        // A send error means the run loop is already gone.
        let _ = self.shutdown_tx.send(ShutdownReason::HostRequested);
        info!("Host requested plugin shutdown");
        Ok(())
    }
}
