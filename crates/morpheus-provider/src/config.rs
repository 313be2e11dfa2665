//! Resolving the provider configuration block.
//!
//! Each attribute is taken from the configuration if set, otherwise from its
//! `MORPHEUS_API_*` environment variable. Empty strings count as unset.

use std::fmt;
use std::sync::Arc;

use morpheus_plugin::Diagnostic;
use serde_json::{Map, Value};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::schema::{self, ACCESS_TOKEN, PASSWORD, TENANT_SUBDOMAIN, URL, USERNAME};

/// Looks up an environment variable by name.
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// An [`EnvLookup`] backed by the process environment.
#[must_use]
pub fn process_env() -> EnvLookup {
    Arc::new(|key| std::env::var(key).ok())
}

/// A string that never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The underlying value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"***\"")
    }
}

/// How the provider authenticates against the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A pre-issued access token.
    AccessToken(Secret),
    /// Username and password, optionally scoped to a sub-tenant.
    Password {
        /// Login name.
        username: String,
        /// Login password.
        password: Secret,
        /// Sub-tenant subdomain.
        tenant_subdomain: Option<String>,
    },
}

/// A validated provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// API base URL.
    pub url: Url,
    /// Authentication.
    pub credentials: Credentials,
}

/// Outcome of resolving a configuration block.
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    /// The configuration, present only when there are no errors.
    pub config: Option<ProviderConfig>,
    /// Errors and warnings, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

/// Raw string values of the known attributes.
#[derive(Default)]
struct RawValues {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    access_token: Option<String>,
    tenant_subdomain: Option<String>,
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Resolve a single attribute from the block, falling back to the environment.
fn attribute(
    block: &Map<String, Value>,
    name: &'static str,
    env: &EnvLookup,
) -> ProviderResult<Option<String>> {
    match block.get(name) {
        Some(Value::String(s)) if !s.is_empty() => return Ok(Some(s.clone())),
        Some(Value::String(_) | Value::Null) | None => {},
        Some(other) => {
            return Err(ProviderError::InvalidType {
                attribute: name,
                found: json_type(other),
            });
        },
    }
    Ok(schema::env_var_for(name).and_then(|key| non_empty(env(key))))
}

fn parse_url(raw: Option<String>) -> ProviderResult<Url> {
    let raw = raw.ok_or(ProviderError::MissingAttribute {
        attribute: URL,
        env: "MORPHEUS_API_URL",
    })?;
    let url = Url::parse(&raw).map_err(|e| ProviderError::InvalidUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ProviderError::InvalidUrl {
            reason: format!("unsupported scheme {}", url.scheme()),
            url: raw,
        });
    }
    if url.host_str().is_none() {
        return Err(ProviderError::InvalidUrl {
            url: raw,
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

fn credentials(raw: RawValues) -> ProviderResult<Credentials> {
    let RawValues {
        username,
        password,
        access_token,
        tenant_subdomain,
        ..
    } = raw;

    match (username, password) {
        (Some(username), Some(password)) => match access_token {
            Some(token) => Ok(Credentials::AccessToken(Secret::new(token))),
            None => Ok(Credentials::Password {
                username,
                password: Secret::new(password),
                tenant_subdomain,
            }),
        },
        (None, None) => match (access_token, tenant_subdomain) {
            (_, Some(_)) => Err(ProviderError::TenantWithoutPassword),
            (Some(token), None) => Ok(Credentials::AccessToken(Secret::new(token))),
            (None, None) => Err(ProviderError::MissingCredentials),
        },
        (Some(_), None) => Err(ProviderError::IncompletePassword {
            present: USERNAME,
            missing: PASSWORD,
        }),
        (None, Some(_)) => Err(ProviderError::IncompletePassword {
            present: PASSWORD,
            missing: USERNAME,
        }),
    }
}

/// Resolve a provider configuration block against the environment.
///
/// Unknown attributes produce warnings. A `null` block is treated as empty so
/// that a provider configured purely from the environment validates.
#[must_use]
pub fn resolve(config: &Value, env: &EnvLookup) -> Resolved {
    let empty = Map::new();
    let block = match config {
        Value::Object(block) => block,
        Value::Null => &empty,
        other => {
            return Resolved {
                config: None,
                diagnostics: vec![ProviderError::NotAnObject(json_type(other)).into()],
            };
        },
    };

    let mut diagnostics: Vec<Diagnostic> = block
        .keys()
        .filter(|key| schema::env_var_for(key).is_none())
        .map(|key| {
            Diagnostic::warning("Unsupported argument")
                .with_detail(format!("the provider does not accept an attribute named {key:?}"))
                .with_attribute(key.clone())
        })
        .collect();

    let mut raw = RawValues::default();
    let mut type_errors = false;
    for (name, slot) in [
        (URL, &mut raw.url),
        (USERNAME, &mut raw.username),
        (PASSWORD, &mut raw.password),
        (ACCESS_TOKEN, &mut raw.access_token),
        (TENANT_SUBDOMAIN, &mut raw.tenant_subdomain),
    ] {
        match attribute(block, name, env) {
            Ok(value) => *slot = value,
            Err(e) => {
                type_errors = true;
                diagnostics.push(e.into());
            },
        }
    }
    if type_errors {
        return Resolved {
            config: None,
            diagnostics,
        };
    }

    if raw.access_token.is_some() && raw.username.is_some() && raw.password.is_some() {
        diagnostics.push(
            Diagnostic::warning("Conflicting credentials")
                .with_detail("access_token is set, so username and password are ignored")
                .with_attribute(ACCESS_TOKEN),
        );
    }

    let url = parse_url(raw.url.take());
    let credentials = credentials(raw);

    match (url, credentials) {
        (Ok(url), Ok(credentials)) => Resolved {
            config: Some(ProviderConfig { url, credentials }),
            diagnostics,
        },
        (url, credentials) => {
            diagnostics.extend(url.err().map(Diagnostic::from));
            diagnostics.extend(credentials.err().map(Diagnostic::from));
            Resolved {
                config: None,
                diagnostics,
            }
        },
    }
}
