//! Process entry point for the Morpheus provider plugin.
//!
//! The binary hands [`morpheus::provider`] to the plugin runtime and blocks
//! until the host is done with it.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::future::Future;

use morpheus_plugin::ServeOpts;

/// Serve options for this provider.
#[must_use]
pub fn serve_opts(debug: bool) -> ServeOpts {
    ServeOpts::new(morpheus::provider).with_debug(debug)
}

/// Invoke `serve` once with this provider's options and wait for it.
pub async fn launch<F, Fut>(debug: bool, serve: F) -> Fut::Output
where
    F: FnOnce(ServeOpts) -> Fut,
    Fut: Future,
{
    serve(serve_opts(debug)).await
}
