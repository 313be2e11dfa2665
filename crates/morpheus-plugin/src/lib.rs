//! Morpheus Plugin - runtime for serving a provider to an infrastructure host.
//!
//! This crate provides:
//! - The host handshake (magic cookie, protocol negotiation, handshake line)
//! - A JSON-RPC provider protocol served over a loopback `WebSocket`
//! - The [`Provider`] trait and the [`ProviderFactory`] handed to [`serve`]
//! - Lifecycle handling: host shutdown requests, SIGTERM, host exit
//! - Reattach mode for running the plugin under a debugger
//!
//! # Example
//!
//! ```rust,no_run
//! use morpheus_plugin::{Provider, ServeOpts, serve};
//!
//! fn provider() -> Box<dyn Provider> {
//!     unimplemented!()
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), morpheus_plugin::PluginError> {
//!     serve(ServeOpts::new(provider)).await
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod config;
pub mod handshake;
pub mod reattach;
pub mod rpc;
pub mod server;
pub mod types;

mod error;
mod provider;
mod serve;

pub use config::ServeConfig;
pub use error::{PluginError, PluginResult};
pub use handshake::HandshakeLine;
pub use provider::{DEFAULT_PROVIDER_ADDR, Provider, ProviderFactory, ServeOpts};
pub use serve::{serve, serve_with_config};
pub use server::{PluginServer, RunOptions, ServeState, ShutdownReason};
pub use types::{Attribute, AttributeType, Diagnostic, ProviderSchema, Schema, Severity};

// Re-exported so provider crates don't need a direct dependency.
pub use async_trait::async_trait;
