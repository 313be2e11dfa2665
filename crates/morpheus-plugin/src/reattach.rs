//! Reattach (debug) mode output.
//!
//! A plugin started by hand under a debugger cannot be launched by the host,
//! so it prints the `TF_REATTACH_PROVIDERS` value the host needs to connect
//! to it instead of a handshake line.

use std::collections::BTreeMap;
use std::io::Write;
use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};
use crate::handshake::{NETWORK, PROTOCOL_NAME};

/// Environment variable the host reads reattach info from.
pub const REATTACH_ENV_KEY: &str = "TF_REATTACH_PROVIDERS";

/// Where a reattachable plugin listens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReattachAddr {
    /// Network type.
    pub network: String,
    /// Address string.
    pub string: String,
}

/// Reattach entry for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReattachConfig {
    /// Wire protocol name.
    pub protocol: String,
    /// Negotiated application protocol version.
    pub protocol_version: u32,
    /// PID of the plugin process.
    pub pid: u32,
    /// The host must not manage (kill) this process.
    pub test: bool,
    /// Listening address.
    pub addr: ReattachAddr,
}

impl ReattachConfig {
    /// Reattach entry for a plugin listening on `addr`.
    #[must_use]
    pub fn new(app_version: u32, addr: SocketAddr, pid: u32) -> Self {
        Self {
            protocol: PROTOCOL_NAME.to_string(),
            protocol_version: app_version,
            pid,
            test: true,
            addr: ReattachAddr {
                network: NETWORK.to_string(),
                string: addr.to_string(),
            },
        }
    }
}

/// JSON value for [`REATTACH_ENV_KEY`], keyed by provider address.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn reattach_value(provider_addr: &str, config: ReattachConfig) -> PluginResult<String> {
    let providers = BTreeMap::from([(provider_addr, config)]);
    serde_json::to_string(&providers)
        .map_err(|e| PluginError::Config(format!("failed to encode reattach config: {e}")))
}

/// Print instructions for attaching the host to this plugin.
///
/// # Errors
///
/// Returns an error if encoding or writing fails.
pub fn write_instructions(
    mut out: impl Write,
    provider_addr: &str,
    config: ReattachConfig,
) -> PluginResult<()> {
    let value = reattach_value(provider_addr, config)?;
    writeln!(
        out,
        "Provider started. To attach the host CLI, set the {REATTACH_ENV_KEY} environment \
         variable with the following:\n"
    )?;
    writeln!(out, "\t{REATTACH_ENV_KEY}='{value}'\n")?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reattach_value_shape() {
        let config = ReattachConfig::new(6, "127.0.0.1:4000".parse().unwrap(), 42);
        let value = reattach_value("registry.terraform.io/gomorpheus/morpheus", config).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&value).unwrap();

        let entry = &parsed["registry.terraform.io/gomorpheus/morpheus"];
        assert_eq!(entry["Protocol"], "jsonrpc");
        assert_eq!(entry["ProtocolVersion"], 6);
        assert_eq!(entry["Pid"], 42);
        assert_eq!(entry["Test"], true);
        assert_eq!(entry["Addr"]["Network"], "tcp");
        assert_eq!(entry["Addr"]["String"], "127.0.0.1:4000");
    }

    #[test]
    fn instructions_contain_env_assignment() {
        let mut buf = Vec::new();
        let config = ReattachConfig::new(5, "127.0.0.1:4001".parse().unwrap(), 7);
        write_instructions(&mut buf, "example.com/acme/thing", config).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("TF_REATTACH_PROVIDERS='{\"example.com/acme/thing\":"));
        // Reattach output must never look like a handshake line.
        assert!(!text.contains("|jsonrpc"));
    }
}
