//! Runtime configuration resolved from the process environment.
//!
//! Everything the runtime needs arrives from the host through environment
//! variables. For local debugging the same settings can be pinned in a TOML
//! file named by `MORPHEUS_PLUGIN_CONFIG`; values from the file win.

use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use morpheus_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

use crate::error::{PluginError, PluginResult};
use crate::handshake::MAGIC_COOKIE_KEY;

/// Host's comma-separated list of application protocol versions.
pub const PROTOCOL_VERSIONS_KEY: &str = "PLUGIN_PROTOCOL_VERSIONS";
/// Lowest port the plugin may listen on.
pub const MIN_PORT_KEY: &str = "PLUGIN_MIN_PORT";
/// Highest port the plugin may listen on.
pub const MAX_PORT_KEY: &str = "PLUGIN_MAX_PORT";
/// Provider-specific log level; takes precedence over [`LOG_KEY`].
pub const PROVIDER_LOG_KEY: &str = "TF_LOG_PROVIDER";
/// Host-wide log level.
pub const LOG_KEY: &str = "TF_LOG";
/// Path to an optional TOML override file.
pub const CONFIG_FILE_KEY: &str = "MORPHEUS_PLUGIN_CONFIG";

fn default_host_check_interval_ms() -> u64 {
    1000
}

/// Runtime settings for [`serve`](crate::serve).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServeConfig {
    /// Magic cookie value as set by the host.
    #[serde(default)]
    pub magic_cookie: Option<String>,
    /// Raw list of protocol versions the host speaks.
    #[serde(default)]
    pub protocol_versions: Option<String>,
    /// Lowest port to try.
    #[serde(default)]
    pub min_port: Option<u16>,
    /// Highest port to try.
    #[serde(default)]
    pub max_port: Option<u16>,
    /// `TF_LOG`-style log level.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Log output format. Overrides the format implied by `log_level`.
    #[serde(default)]
    pub log_format: Option<LogFormat>,
    /// Log span open and close events.
    #[serde(default)]
    pub log_span_events: bool,
    /// Extra filter directives such as `jsonrpsee=warn`.
    #[serde(default)]
    pub log_directives: Vec<String>,
    /// How often to check that the host process is still alive.
    #[serde(default = "default_host_check_interval_ms")]
    pub host_check_interval_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            magic_cookie: None,
            protocol_versions: None,
            min_port: None,
            max_port: None,
            log_level: None,
            log_format: None,
            log_span_events: false,
            log_directives: Vec::new(),
            host_check_interval_ms: default_host_check_interval_ms(),
        }
    }
}

impl ServeConfig {
    /// Resolve configuration from the current process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a port is unparseable or the override file is
    /// unreadable.
    pub fn from_env() -> PluginResult<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Resolve configuration from an explicit set of variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a port is unparseable or the override file is
    /// unreadable.
    pub fn from_vars<I, K, V>(vars: I) -> PluginResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        let mut tf_log = None;
        let mut provider_log = None;
        let mut config_file = None;

        for (key, value) in vars {
            let value = value.into();
            match key.as_ref() {
                MAGIC_COOKIE_KEY => config.magic_cookie = Some(value),
                PROTOCOL_VERSIONS_KEY => config.protocol_versions = Some(value),
                MIN_PORT_KEY => config.min_port = Some(parse_port(MIN_PORT_KEY, &value)?),
                MAX_PORT_KEY => config.max_port = Some(parse_port(MAX_PORT_KEY, &value)?),
                PROVIDER_LOG_KEY => provider_log = Some(value),
                LOG_KEY => tf_log = Some(value),
                CONFIG_FILE_KEY => config_file = Some(value),
                _ => {},
            }
        }
        config.log_level = provider_log.filter(|v| !v.is_empty()).or(tf_log);

        match config_file {
            Some(path) if !path.is_empty() => Ok(config.overlay(Self::load(path)?)),
            _ => Ok(config),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> PluginResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| PluginError::Config(format!("invalid config {}: {e}", path.display())))
    }

    /// Apply every value set in `other` on top of `self`.
    #[must_use]
    pub fn overlay(self, other: Self) -> Self {
        Self {
            magic_cookie: other.magic_cookie.or(self.magic_cookie),
            protocol_versions: other.protocol_versions.or(self.protocol_versions),
            min_port: other.min_port.or(self.min_port),
            max_port: other.max_port.or(self.max_port),
            log_level: other.log_level.or(self.log_level),
            log_format: other.log_format.or(self.log_format),
            log_span_events: other.log_span_events || self.log_span_events,
            log_directives: if other.log_directives.is_empty() {
                self.log_directives
            } else {
                other.log_directives
            },
            host_check_interval_ms: if other.host_check_interval_ms
                == default_host_check_interval_ms()
            {
                self.host_check_interval_ms
            } else {
                other.host_check_interval_ms
            },
        }
    }

    /// Ports the listener may use, or `None` to let the OS pick.
    ///
    /// # Errors
    ///
    /// Returns an error if only one bound is set or `min > max`.
    pub fn port_range(&self) -> PluginResult<Option<RangeInclusive<u16>>> {
        match (self.min_port, self.max_port) {
            (None, None) => Ok(None),
            (Some(min), Some(max)) if min <= max => Ok(Some(min..=max)),
            (Some(min), Some(max)) => Err(PluginError::Config(format!(
                "{MIN_PORT_KEY} ({min}) is greater than {MAX_PORT_KEY} ({max})"
            ))),
            _ => Err(PluginError::Config(format!(
                "{MIN_PORT_KEY} and {MAX_PORT_KEY} must be set together"
            ))),
        }
    }

    /// Logging configuration for the plugin process.
    #[must_use]
    pub fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_tf_log(self.log_level.as_deref());
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        if self.log_span_events {
            config = config.with_span_events();
        }
        self.log_directives
            .iter()
            .fold(config, |config, directive| config.with_directive(directive))
    }

    /// Interval between host liveness checks, floored at 50ms.
    #[must_use]
    pub fn host_check_interval(&self) -> Duration {
        Duration::from_millis(self.host_check_interval_ms.max(50))
    }
}

fn parse_port(key: &str, value: &str) -> PluginResult<u16> {
    value
        .trim()
        .parse()
        .map_err(|e| PluginError::Config(format!("invalid {key} {value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handshake::MAGIC_COOKIE_VALUE;

    #[test]
    fn empty_environment_gives_defaults() {
        let config = ServeConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config, ServeConfig::default());
        assert_eq!(config.port_range().unwrap(), None);
    }

    #[test]
    fn reads_host_variables() {
        let config = ServeConfig::from_vars([
            (MAGIC_COOKIE_KEY, MAGIC_COOKIE_VALUE),
            (PROTOCOL_VERSIONS_KEY, "5,6"),
            (MIN_PORT_KEY, "10000"),
            (MAX_PORT_KEY, "10010"),
            ("UNRELATED", "ignored"),
        ])
        .unwrap();

        assert_eq!(config.magic_cookie.as_deref(), Some(MAGIC_COOKIE_VALUE));
        assert_eq!(config.protocol_versions.as_deref(), Some("5,6"));
        assert_eq!(config.port_range().unwrap(), Some(10000..=10010));
    }

    #[test]
    fn invalid_port_is_config_error() {
        let err = ServeConfig::from_vars([(MIN_PORT_KEY, "ten")]).unwrap_err();
        assert!(matches!(err, PluginError::Config(_)));
    }

    #[test]
    fn port_range_validation() {
        let inverted = ServeConfig {
            min_port: Some(20),
            max_port: Some(10),
            ..ServeConfig::default()
        };
        assert!(inverted.port_range().is_err());

        let half = ServeConfig {
            min_port: Some(20),
            ..ServeConfig::default()
        };
        assert!(half.port_range().is_err());
    }

    #[test]
    fn provider_log_wins_over_tf_log() {
        let config =
            ServeConfig::from_vars([(LOG_KEY, "INFO"), (PROVIDER_LOG_KEY, "DEBUG")]).unwrap();
        assert_eq!(config.log_config().level, "debug");

        let config = ServeConfig::from_vars([(LOG_KEY, "JSON"), (PROVIDER_LOG_KEY, "")]).unwrap();
        let log = config.log_config();
        assert_eq!(log.level, "trace");
        assert_eq!(log.format, LogFormat::Json);
    }

    #[test]
    fn config_file_overrides_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.toml");
        std::fs::write(
            &path,
            "protocol_versions = \"5\"\nmin_port = 12000\nmax_port = 12001\nhost_check_interval_ms = 250\n",
        )
        .unwrap();

        let path_str = path.to_string_lossy().to_string();
        let config = ServeConfig::from_vars([
            (MAGIC_COOKIE_KEY, MAGIC_COOKIE_VALUE.to_string()),
            (PROTOCOL_VERSIONS_KEY, "6".to_string()),
            (CONFIG_FILE_KEY, path_str),
        ])
        .unwrap();

        assert_eq!(config.magic_cookie.as_deref(), Some(MAGIC_COOKIE_VALUE));
        assert_eq!(config.protocol_versions.as_deref(), Some("5"));
        assert_eq!(config.port_range().unwrap(), Some(12000..=12001));
        assert_eq!(config.host_check_interval(), Duration::from_millis(250));
    }

    #[test]
    fn config_file_tunes_logging() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.toml");
        std::fs::write(
            &path,
            "log_format = \"pretty\"\nlog_span_events = true\nlog_directives = [\"jsonrpsee=warn\"]\n",
        )
        .unwrap();

        let config = ServeConfig::from_vars([
            (LOG_KEY, "JSON".to_string()),
            (CONFIG_FILE_KEY, path.to_string_lossy().to_string()),
        ])
        .unwrap();

        let log = config.log_config();
        assert_eq!(log.level, "trace");
        assert_eq!(log.format, LogFormat::Pretty);
        assert!(log.span_events);
        assert_eq!(log.directives, vec!["jsonrpsee=warn"]);
    }

    #[test]
    fn logging_defaults_follow_tf_log() {
        let log = ServeConfig::from_vars([(LOG_KEY, "INFO")]).unwrap().log_config();
        assert_eq!(log.level, "info");
        assert_eq!(log.format, LogFormat::Compact);
        assert!(!log.span_events);
        assert!(log.directives.is_empty());
    }

    #[test]
    fn malformed_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plugin.toml");
        std::fs::write(&path, "min_port = \"not a number\"").unwrap();

        assert!(matches!(
            ServeConfig::load(&path),
            Err(PluginError::Config(_))
        ));
    }

    #[test]
    fn host_check_interval_is_floored() {
        let config = ServeConfig {
            host_check_interval_ms: 0,
            ..ServeConfig::default()
        };
        assert_eq!(config.host_check_interval(), Duration::from_millis(50));
    }
}
