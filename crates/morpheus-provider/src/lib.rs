//! Morpheus provider.
//!
//! The provider accepts the Morpheus appliance URL and either an access token
//! or a username/password pair. Unset attributes default to the matching
//! `MORPHEUS_API_*` environment variable.
//!
//! [`provider`] is the factory handed to [`morpheus_plugin::serve`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod schema;

mod error;
mod provider;

pub use config::{Credentials, ProviderConfig, Resolved, Secret};
pub use error::{ProviderError, ProviderResult};
pub use provider::MorpheusProvider;

use morpheus_plugin::Provider;

/// Create a new Morpheus provider.
#[must_use]
pub fn provider() -> Box<dyn Provider> {
    Box::new(MorpheusProvider::new())
}
