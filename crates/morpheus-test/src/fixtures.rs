//! Test fixtures for host configuration and provider blocks.

use morpheus_plugin::ServeConfig;
use morpheus_plugin::handshake::MAGIC_COOKIE_VALUE;
use morpheus_telemetry::{LogConfig, LogFormat};
use serde_json::{Value, json};

/// Appliance URL used by the provider fixtures.
pub const TEST_API_URL: &str = "https://morpheus.test.local";

/// Host configuration as a host speaking protocols 5 and 6 would set it.
#[must_use]
pub fn host_config() -> ServeConfig {
    ServeConfig {
        magic_cookie: Some(MAGIC_COOKIE_VALUE.to_string()),
        protocol_versions: Some("5,6".to_string()),
        ..ServeConfig::default()
    }
}

/// A provider block authenticating with an access token.
#[must_use]
pub fn token_provider_config() -> Value {
    json!({
        "url": TEST_API_URL,
        "access_token": "test-token",
    })
}

/// A provider block authenticating with username and password.
#[must_use]
pub fn password_provider_config() -> Value {
    json!({
        "url": TEST_API_URL,
        "username": "admin",
        "password": "test-password",
        "tenant_subdomain": "acme",
    })
}

/// Send debug logs to stderr. Safe to call from every test.
pub fn init_test_logging() {
    let config = LogConfig::new("debug")
        .with_format(LogFormat::Compact)
        .without_timestamps();
    // Already initialized by an earlier test in this binary.
    let _ = morpheus_telemetry::setup_logging(&config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_config_passes_handshake() {
        let config = host_config();
        morpheus_plugin::handshake::verify_magic_cookie(&config).unwrap();
        assert_eq!(
            morpheus_plugin::handshake::negotiate_version(config.protocol_versions.as_deref())
                .unwrap(),
            6
        );
    }

    #[test]
    fn init_twice_is_harmless() {
        init_test_logging();
        init_test_logging();
    }
}
