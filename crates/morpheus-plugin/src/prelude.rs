//! Prelude module - commonly used types for convenient import.
//!
//! Use `use morpheus_plugin::prelude::*;` in provider crates.

// Errors
pub use crate::{PluginError, PluginResult};

// Provider contract
pub use crate::{Provider, ProviderFactory, ServeOpts, async_trait};

// Protocol types
pub use crate::{Attribute, AttributeType, Diagnostic, ProviderSchema, Schema, Severity};

// Serving
pub use crate::{ServeConfig, serve};
