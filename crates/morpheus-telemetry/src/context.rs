//! Per-call context for host RPC requests.

use chrono::{DateTime, Utc};
use tracing::Span;
use uuid::Uuid;

/// Identity and timing of a single host request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique request identifier, recorded on the span.
    pub request_id: Uuid,
    /// When handling started.
    pub started_at: DateTime<Utc>,
    /// RPC namespace that received the call.
    pub source: &'static str,
    /// Method being handled.
    pub operation: &'static str,
}

impl RequestContext {
    /// Context for `operation` received on `source`.
    #[must_use]
    pub fn new(source: &'static str, operation: &'static str) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            started_at: Utc::now(),
            source,
            operation,
        }
    }

    /// Milliseconds since handling started.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds()
    }

    /// A `request` span carrying the request ID, source and operation.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            source = self.source,
            operation = self.operation,
        )
    }
}

/// Enters a request span for a synchronous handler and logs completion on drop.
///
/// Async handlers instrument their future with [`RequestContext::span`] instead;
/// the entered span is not `Send`.
pub struct RequestGuard {
    context: RequestContext,
    _span: tracing::span::EnteredSpan,
}

impl RequestGuard {
    /// Enter the context's span and log the start of the request.
    #[must_use]
    pub fn new(context: RequestContext) -> Self {
        let span = context.span().entered();
        tracing::debug!("Request started");
        Self {
            context,
            _span: span,
        }
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        tracing::debug!(elapsed_ms = self.context.elapsed_ms(), "Request completed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_get_distinct_ids() {
        let a = RequestContext::new("provider", "getSchema");
        let b = RequestContext::new("provider", "getSchema");
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.operation, "getSchema");
    }

    #[test]
    fn elapsed_grows() {
        let ctx = RequestContext::new("plugin", "shutdown");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(ctx.elapsed_ms() >= 10);
    }

    #[test]
    fn guard_drops_cleanly_without_subscriber() {
        let guard = RequestGuard::new(RequestContext::new("plugin", "shutdown"));
        drop(guard);
    }
}
