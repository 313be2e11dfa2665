//! Morpheus Test - Shared test utilities for the provider plugin.
//!
//! This crate provides a recording mock provider, host-side fixtures and a
//! harness that runs a plugin server in the background.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! morpheus-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use morpheus_plugin::{Provider, rpc::ProviderRpcClient};
//! use morpheus_test::RunningPlugin;
//!
//! fn factory() -> Box<dyn Provider> {
//!     morpheus::provider()
//! }
//!
//! #[tokio::test]
//! async fn schema_over_rpc() {
//!     let plugin = RunningPlugin::start(factory).await.unwrap();
//!     let client = plugin.client().await.unwrap();
//!     let schema = client.get_schema().await.unwrap();
//!     assert!(schema.provider.attributes.contains_key("url"));
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
