//! Logging configuration and setup.
//!
//! Every layer writes to stderr: a plugin's stdout carries the handshake.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Log format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable format.
    Pretty,
    /// Compact single-line format (default).
    #[default]
    Compact,
    /// JSON format for structured logging.
    Json,
    /// Full format with all fields.
    Full,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level filter (e.g., "info", "debug", "trace", "off").
    pub level: String,
    /// Log format.
    pub format: LogFormat,
    /// Whether to include timestamps.
    pub timestamps: bool,
    /// Whether to log span open/close events.
    pub span_events: bool,
    /// Directive overrides (e.g., `jsonrpsee=warn`).
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            timestamps: true,
            span_events: false,
            directives: Vec::new(),
        }
    }
}

impl LogConfig {
    /// Create a new log config with the given level.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Default::default()
        }
    }

    /// Build a config from a host `TF_LOG`-style value.
    ///
    /// Recognized levels map onto the matching filter. `JSON` means trace
    /// level with JSON output. Any other non-empty value means trace, the
    /// same way the host treats it. `None` or an empty string keeps the
    /// default level.
    #[must_use]
    pub fn from_tf_log(value: Option<&str>) -> Self {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return Self::default();
        };

        match raw.to_ascii_uppercase().as_str() {
            "JSON" => Self::new("trace").with_format(LogFormat::Json),
            "OFF" => Self::new("off"),
            level @ ("TRACE" | "DEBUG" | "INFO" | "WARN" | "ERROR") => {
                Self::new(level.to_ascii_lowercase())
            },
            _ => Self::new("trace"),
        }
    }

    /// Set the log format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Add a directive override.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Disable timestamps.
    #[must_use]
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    /// Log span open/close events.
    #[must_use]
    pub fn with_span_events(mut self) -> Self {
        self.span_events = true;
        self
    }

    fn build_filter(&self) -> TelemetryResult<EnvFilter> {
        let mut filter = EnvFilter::try_new(&self.level)
            .map_err(|e| TelemetryError::ConfigError(e.to_string()))?;

        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(
                |e: tracing_subscriber::filter::ParseError| {
                    TelemetryError::ConfigError(e.to_string())
                },
            )?);
        }

        Ok(filter)
    }

    fn span_events(&self) -> FmtSpan {
        if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        }
    }

    fn build_layer(&self) -> TelemetryResult<Box<dyn Layer<Registry> + Send + Sync>> {
        let filter = self.build_filter()?;
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_span_events(self.span_events());

        let layer = match (self.format, self.timestamps) {
            (LogFormat::Json, true) => base.json().with_filter(filter).boxed(),
            (LogFormat::Json, false) => base.json().without_time().with_filter(filter).boxed(),
            (LogFormat::Pretty, true) => base.pretty().with_filter(filter).boxed(),
            (LogFormat::Pretty, false) => base.pretty().without_time().with_filter(filter).boxed(),
            (LogFormat::Compact, true) => base.compact().with_filter(filter).boxed(),
            (LogFormat::Compact, false) => {
                base.compact().without_time().with_filter(filter).boxed()
            },
            (LogFormat::Full, true) => base.with_filter(filter).boxed(),
            (LogFormat::Full, false) => base.without_time().with_filter(filter).boxed(),
        };

        Ok(layer)
    }
}

/// Install a global subscriber for `config`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a global subscriber
/// is already installed.
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let layer = config.build_layer()?;

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::InitError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.timestamps);
        assert!(!config.span_events);
    }

    #[test]
    fn test_log_config_builder() {
        let config = LogConfig::new("debug")
            .with_format(LogFormat::Json)
            .without_timestamps()
            .with_span_events()
            .with_directive("morpheus_plugin=trace");

        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.timestamps);
        assert_eq!(config.span_events(), FmtSpan::NEW | FmtSpan::CLOSE);
        assert_eq!(config.directives, vec!["morpheus_plugin=trace"]);
    }

    #[test]
    fn test_from_tf_log_levels() {
        assert_eq!(LogConfig::from_tf_log(Some("DEBUG")).level, "debug");
        assert_eq!(LogConfig::from_tf_log(Some("warn")).level, "warn");
        assert_eq!(LogConfig::from_tf_log(Some("off")).level, "off");
        assert_eq!(LogConfig::from_tf_log(None).level, "warn");
        assert_eq!(LogConfig::from_tf_log(Some("  ")).level, "warn");
    }

    #[test]
    fn test_from_tf_log_json_and_unknown() {
        let json = LogConfig::from_tf_log(Some("JSON"));
        assert_eq!(json.level, "trace");
        assert_eq!(json.format, LogFormat::Json);

        // The host treats any unrecognized value as trace.
        let unknown = LogConfig::from_tf_log(Some("1"));
        assert_eq!(unknown.level, "trace");
        assert_eq!(unknown.format, LogFormat::Compact);
    }

    #[test]
    fn test_log_format_names() {
        let parsed: LogFormat = serde_json::from_str("\"pretty\"").unwrap();
        assert_eq!(parsed, LogFormat::Pretty);
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
    }

    #[test]
    fn test_build_filter() {
        let config = LogConfig::new("debug").with_directive("morpheus=trace");
        assert!(config.build_filter().is_ok());
    }

    #[test]
    fn test_build_filter_invalid() {
        // EnvFilter is permissive with unknown targets, so we test invalid syntax
        let config = LogConfig::new("debug").with_directive("[invalid=syntax");
        assert!(config.build_filter().is_err());
    }

    #[test]
    fn test_build_layer_every_format() {
        for format in [
            LogFormat::Pretty,
            LogFormat::Compact,
            LogFormat::Json,
            LogFormat::Full,
        ] {
            assert!(
                LogConfig::new("info")
                    .with_format(format)
                    .with_span_events()
                    .build_layer()
                    .is_ok()
            );
            assert!(
                LogConfig::new("info")
                    .with_format(format)
                    .without_timestamps()
                    .build_layer()
                    .is_ok()
            );
        }
    }
}
