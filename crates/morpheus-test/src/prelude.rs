//! Prelude module - commonly used test helpers.
//!
//! Use `use morpheus_test::prelude::*;` in test modules.

pub use crate::fixtures::{
    TEST_API_URL, host_config, init_test_logging, password_provider_config, token_provider_config,
};
pub use crate::harness::RunningPlugin;
pub use crate::mocks::{MockProvider, ProviderCall};
