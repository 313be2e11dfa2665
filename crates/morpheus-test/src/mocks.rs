//! Mock implementations for testing.

use std::sync::{Arc, Mutex, PoisonError};

use morpheus_plugin::{Attribute, Diagnostic, Provider, ProviderSchema, Schema, async_trait};
use serde_json::Value;

/// A call received by [`MockProvider`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    /// `schema`
    Schema,
    /// `validate_config` with the given block.
    ValidateConfig(Value),
    /// `configure` with the given block.
    Configure(Value),
    /// `stop`
    Stop,
}

/// Mock implementation of the `Provider` trait for testing.
///
/// Clones share the call log, so a test can keep one handle while the server
/// owns another.
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Every call, in order.
    calls: Arc<Mutex<Vec<ProviderCall>>>,
    /// Schema to return.
    schema: ProviderSchema,
    /// Diagnostics returned from `validate_config`.
    validate_diagnostics: Vec<Diagnostic>,
    /// Diagnostics returned from `configure`.
    configure_diagnostics: Vec<Diagnostic>,
    /// Error returned from `stop`.
    stop_error: Option<String>,
}

impl MockProvider {
    /// Create a mock with a single required `endpoint` attribute.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            schema: ProviderSchema::new(
                Schema::v0().with_attribute("endpoint", Attribute::required_string()),
            ),
            validate_diagnostics: Vec::new(),
            configure_diagnostics: Vec::new(),
            stop_error: None,
        }
    }

    /// Return `schema` from `schema`.
    #[must_use]
    pub fn with_schema(mut self, schema: ProviderSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Return `diagnostics` from `validate_config`.
    #[must_use]
    pub fn with_validate_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.validate_diagnostics = diagnostics;
        self
    }

    /// Return `diagnostics` from `configure`.
    #[must_use]
    pub fn with_configure_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.configure_diagnostics = diagnostics;
        self
    }

    /// Fail `stop` with `message`.
    #[must_use]
    pub fn with_stop_error(mut self, message: impl Into<String>) -> Self {
        self.stop_error = Some(message.into());
        self
    }

    /// All calls received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.lock().clone()
    }

    /// Number of `stop` calls received so far.
    #[must_use]
    pub fn stop_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|c| matches!(c, ProviderCall::Stop))
            .count()
    }

    fn record(&self, call: ProviderCall) {
        self.lock().push(call);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ProviderCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn schema(&self) -> ProviderSchema {
        self.record(ProviderCall::Schema);
        self.schema.clone()
    }

    async fn validate_config(&self, config: &Value) -> Vec<Diagnostic> {
        self.record(ProviderCall::ValidateConfig(config.clone()));
        self.validate_diagnostics.clone()
    }

    async fn configure(&self, config: Value) -> Vec<Diagnostic> {
        self.record(ProviderCall::Configure(config));
        self.configure_diagnostics.clone()
    }

    async fn stop(&self) -> Result<(), String> {
        self.record(ProviderCall::Stop);
        match &self.stop_error {
            Some(message) => Err(message.clone()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_calls_across_clones() {
        let mock = MockProvider::new()
            .with_configure_diagnostics(vec![Diagnostic::warning("deprecated")]);
        let served = mock.clone();

        let diagnostics = served.configure(serde_json::json!({"endpoint": "x"})).await;
        assert_eq!(diagnostics.len(), 1);
        served.stop().await.unwrap();

        assert_eq!(
            mock.calls(),
            vec![
                ProviderCall::Configure(serde_json::json!({"endpoint": "x"})),
                ProviderCall::Stop,
            ]
        );
        assert_eq!(mock.stop_count(), 1);
    }

    #[tokio::test]
    async fn stop_error() {
        let mock = MockProvider::new().with_stop_error("busy");
        assert_eq!(mock.stop().await, Err("busy".to_string()));
    }
}
