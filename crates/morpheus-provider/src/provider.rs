//! The Morpheus provider.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use morpheus_plugin::types::has_errors;
use morpheus_plugin::{Diagnostic, Provider, ProviderSchema, async_trait};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::{self, Credentials, EnvLookup, ProviderConfig};
use crate::schema;

/// Provider for the Morpheus cloud management platform.
///
/// Configuration is validated and stored; no API calls are made.
pub struct MorpheusProvider {
    env: EnvLookup,
    config: RwLock<Option<ProviderConfig>>,
    stopped: AtomicBool,
}

impl MorpheusProvider {
    /// A provider reading defaults from the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::with_env(config::process_env())
    }

    /// A provider reading defaults through `env`.
    #[must_use]
    pub fn with_env(env: EnvLookup) -> Self {
        Self {
            env,
            config: RwLock::new(None),
            stopped: AtomicBool::new(false),
        }
    }

    /// The configuration stored by the last successful `configure`.
    pub async fn current_config(&self) -> Option<ProviderConfig> {
        self.config.read().await.clone()
    }

    /// Whether `stop` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Default for MorpheusProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MorpheusProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MorpheusProvider")
            .field("stopped", &self.is_stopped())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Provider for MorpheusProvider {
    fn schema(&self) -> ProviderSchema {
        schema::provider_schema()
    }

    async fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        config::resolve(config, &self.env).diagnostics
    }

    async fn configure(&self, config: Value) -> Vec<Diagnostic> {
        let resolved = config::resolve(&config, &self.env);
        let Some(config) = resolved.config else {
            debug_assert!(has_errors(&resolved.diagnostics));
            return resolved.diagnostics;
        };

        let method = match &config.credentials {
            Credentials::AccessToken(_) => "access_token",
            Credentials::Password { .. } => "password",
        };
        info!(url = %config.url, auth = method, "Provider configured");

        *self.config.write().await = Some(config);
        resolved.diagnostics
    }

    async fn stop(&self) -> Result<(), String> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            debug!("Provider already stopped");
        } else {
            info!("Provider stopped");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn provider_with_token_env() -> MorpheusProvider {
        MorpheusProvider::with_env(Arc::new(|key| match key {
            "MORPHEUS_API_URL" => Some("https://morpheus.example.com".to_string()),
            "MORPHEUS_API_TOKEN" => Some("secret-token".to_string()),
            _ => None,
        }))
    }

    #[tokio::test]
    async fn configure_stores_config() {
        let provider = provider_with_token_env();
        assert!(provider.current_config().await.is_none());

        let diagnostics = provider.configure(json!({})).await;
        assert!(diagnostics.is_empty());

        let config = provider.current_config().await.unwrap();
        assert_eq!(config.url.host_str(), Some("morpheus.example.com"));
    }

    #[tokio::test]
    async fn failed_configure_keeps_previous_config() {
        let provider = provider_with_token_env();
        provider.configure(Value::Null).await;

        let diagnostics = provider.configure(json!({"url": "gopher://x"})).await;
        assert!(has_errors(&diagnostics));
        assert_eq!(
            provider.current_config().await.unwrap().url.scheme(),
            "https"
        );
    }

    #[tokio::test]
    async fn validate_does_not_store() {
        let provider = provider_with_token_env();
        assert!(provider.validate_config(&json!({})).await.is_empty());
        assert!(provider.current_config().await.is_none());
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let provider = MorpheusProvider::with_env(Arc::new(|_| None));
        assert!(!provider.is_stopped());
        provider.stop().await.unwrap();
        provider.stop().await.unwrap();
        assert!(provider.is_stopped());
    }

    #[test]
    fn debug_hides_config() {
        let debug = format!("{:?}", provider_with_token_env());
        assert!(debug.starts_with("MorpheusProvider"));
        assert!(!debug.contains("secret-token"));
    }
}
