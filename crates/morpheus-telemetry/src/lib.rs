//! Morpheus Telemetry - Logging and tracing for the Morpheus provider plugin.
//!
//! This crate provides:
//! - Logging setup driven by the host's `TF_LOG` conventions
//! - Request context for correlating host RPC calls
//! - Integration with the tracing ecosystem
//!
//! A plugin's stdout belongs to the handshake, so logs always go to stderr.
//!
//! # Example
//!
//! ```rust,no_run
//! use morpheus_telemetry::{LogConfig, LogFormat, setup_logging, RequestContext};
//!
//! # fn main() -> Result<(), morpheus_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Json)
//!     .with_directive("jsonrpsee=warn");
//!
//! setup_logging(&config)?;
//!
//! let ctx = RequestContext::new("provider", "getSchema");
//! let span = ctx.span();
//! let _guard = span.enter();
//! tracing::info!("Serving schema");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{RequestContext, RequestGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, setup_logging};
