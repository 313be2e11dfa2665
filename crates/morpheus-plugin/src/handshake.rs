//! Host handshake: magic cookie, protocol negotiation and the handshake line.
//!
//! The host launches the plugin with a shared cookie in the environment and a
//! list of protocol versions it speaks. Once listening, the plugin answers
//! with one line on stdout:
//!
//! ```text
//! 1|6|tcp|127.0.0.1:41233|jsonrpc
//! ```
//!
//! Format: `CORE|APP|NETWORK|ADDR|PROTOCOL`.

use std::fmt;
use std::io::Write;
use std::net::SocketAddr;
use std::str::FromStr;

use tracing::warn;

use crate::config::ServeConfig;
use crate::error::{PluginError, PluginResult};

/// Environment variable holding the magic cookie.
pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";

/// Value the host sets for [`MAGIC_COOKIE_KEY`].
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

/// Version of the handshake itself.
pub const CORE_PROTOCOL_VERSION: u32 = 1;

/// Application protocol versions this plugin speaks, ascending.
pub const SUPPORTED_PROTOCOL_VERSIONS: [u32; 2] = [5, 6];

/// Wire protocol name reported in the handshake line.
pub const PROTOCOL_NAME: &str = "jsonrpc";

/// Network type reported in the handshake line.
pub const NETWORK: &str = "tcp";

/// Printed when the binary is run by hand instead of by a host.
pub const NOT_A_PLUGIN_MESSAGE: &str = "This binary is a plugin. These are not meant to be \
    executed directly. Please execute the program that consumes these plugins, which will \
    load any plugins automatically";

/// Check that a host launched this process.
///
/// # Errors
///
/// Returns [`PluginError::NotLaunchedByHost`] if the cookie is missing or wrong.
pub fn verify_magic_cookie(config: &ServeConfig) -> PluginResult<()> {
    match config.magic_cookie.as_deref() {
        Some(MAGIC_COOKIE_VALUE) => Ok(()),
        _ => Err(PluginError::NotLaunchedByHost),
    }
}

/// Pick the application protocol version to speak.
///
/// `host_versions` is the raw comma-separated list the host advertised.
/// Without a list the plugin's newest version is used; otherwise the newest
/// version both sides share wins.
///
/// # Errors
///
/// Returns [`PluginError::IncompatibleProtocol`] if the sets are disjoint.
pub fn negotiate_version(host_versions: Option<&str>) -> PluginResult<u32> {
    let [.., newest] = SUPPORTED_PROTOCOL_VERSIONS;
    let Some(raw) = host_versions.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(newest);
    };

    let host: Vec<u32> = raw
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            match entry.parse::<u32>() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!(entry, "Ignoring unparseable host protocol version");
                    None
                },
            }
        })
        .collect();

    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .rev()
        .find(|v| host.contains(*v))
        .copied()
        .ok_or_else(|| PluginError::IncompatibleProtocol {
            host,
            supported: SUPPORTED_PROTOCOL_VERSIONS.to_vec(),
        })
}

/// The line a plugin prints once it is ready for the host to connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandshakeLine {
    /// Handshake version.
    pub core_version: u32,
    /// Negotiated application protocol version.
    pub app_version: u32,
    /// Address the RPC server listens on.
    pub addr: SocketAddr,
}

impl HandshakeLine {
    /// Handshake line for a server listening on `addr`.
    #[must_use]
    pub fn new(app_version: u32, addr: SocketAddr) -> Self {
        Self {
            core_version: CORE_PROTOCOL_VERSION,
            app_version,
            addr,
        }
    }

    /// Write the line, newline-terminated, and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer fails.
    pub fn write_to(&self, mut out: impl Write) -> PluginResult<()> {
        writeln!(out, "{self}")?;
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for HandshakeLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{NETWORK}|{}|{PROTOCOL_NAME}",
            self.core_version, self.app_version, self.addr
        )
    }
}

impl FromStr for HandshakeLine {
    type Err = PluginError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |why: &str| PluginError::Config(format!("malformed handshake line {s:?}: {why}"));

        let parts: Vec<&str> = s.trim_end().split('|').collect();
        let [core, app, network, addr, protocol] = parts.as_slice() else {
            return Err(bad("expected 5 fields"));
        };
        if *network != NETWORK {
            return Err(bad("unsupported network"));
        }
        if *protocol != PROTOCOL_NAME {
            return Err(bad("unsupported protocol"));
        }

        Ok(Self {
            core_version: core.parse().map_err(|_| bad("core version"))?,
            app_version: app.parse().map_err(|_| bad("app version"))?,
            addr: addr.parse().map_err(|_| bad("address"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_cookie(cookie: Option<&str>) -> ServeConfig {
        ServeConfig {
            magic_cookie: cookie.map(str::to_string),
            ..ServeConfig::default()
        }
    }

    #[test]
    fn magic_cookie_accepted() {
        assert!(verify_magic_cookie(&config_with_cookie(Some(MAGIC_COOKIE_VALUE))).is_ok());
    }

    #[test]
    fn magic_cookie_missing_or_wrong() {
        assert!(matches!(
            verify_magic_cookie(&config_with_cookie(None)),
            Err(PluginError::NotLaunchedByHost)
        ));
        assert!(matches!(
            verify_magic_cookie(&config_with_cookie(Some("nope"))),
            Err(PluginError::NotLaunchedByHost)
        ));
    }

    #[test]
    fn negotiate_defaults_to_newest() {
        assert_eq!(negotiate_version(None).unwrap(), 6);
        assert_eq!(negotiate_version(Some("")).unwrap(), 6);
    }

    #[test]
    fn negotiate_picks_highest_common() {
        assert_eq!(negotiate_version(Some("5,6")).unwrap(), 6);
        assert_eq!(negotiate_version(Some("4, 5")).unwrap(), 5);
        assert_eq!(negotiate_version(Some("7,6,5")).unwrap(), 6);
    }

    #[test]
    fn negotiate_skips_garbage() {
        assert_eq!(negotiate_version(Some("x,5,")).unwrap(), 5);
    }

    #[test]
    fn negotiate_rejects_disjoint() {
        let err = negotiate_version(Some("3,4")).unwrap_err();
        match err {
            PluginError::IncompatibleProtocol { host, supported } => {
                assert_eq!(host, vec![3, 4]);
                assert_eq!(supported, vec![5, 6]);
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn handshake_line_format() {
        let line = HandshakeLine::new(6, "127.0.0.1:41233".parse().unwrap());
        assert_eq!(line.to_string(), "1|6|tcp|127.0.0.1:41233|jsonrpc");
    }

    #[test]
    fn handshake_line_written_once_with_newline() {
        let mut buf = Vec::new();
        HandshakeLine::new(5, "127.0.0.1:10000".parse().unwrap())
            .write_to(&mut buf)
            .unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "1|5|tcp|127.0.0.1:10000|jsonrpc\n");
    }

    #[test]
    fn handshake_line_parses() {
        let line: HandshakeLine = "1|6|tcp|127.0.0.1:5000|jsonrpc\n".parse().unwrap();
        assert_eq!(line.core_version, 1);
        assert_eq!(line.app_version, 6);
        assert_eq!(line.addr.port(), 5000);
    }

    #[test]
    fn handshake_line_rejects_foreign_protocol() {
        assert!("1|6|tcp|127.0.0.1:5000|grpc".parse::<HandshakeLine>().is_err());
        assert!("1|6|unix|/tmp/sock|jsonrpc".parse::<HandshakeLine>().is_err());
        assert!("1|6|tcp".parse::<HandshakeLine>().is_err());
    }
}
