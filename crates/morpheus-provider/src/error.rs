//! Provider configuration errors.

use morpheus_plugin::Diagnostic;

/// Problems found while resolving the provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The configuration block is not an object.
    #[error("provider configuration must be an object, got {0}")]
    NotAnObject(&'static str),

    /// A known attribute has the wrong type.
    #[error("attribute {attribute} must be a string, got {found}")]
    InvalidType {
        /// Attribute name.
        attribute: &'static str,
        /// JSON type that was found.
        found: &'static str,
    },

    /// A required attribute is neither configured nor set in the environment.
    #[error("missing required attribute {attribute} (or set {env})")]
    MissingAttribute {
        /// Attribute name.
        attribute: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },

    /// The API URL is unusable.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Neither an access token nor a username/password pair is available.
    #[error("missing credentials: set access_token, or both username and password")]
    MissingCredentials,

    /// Only one half of the username/password pair is set.
    #[error("{present} is set but {missing} is not")]
    IncompletePassword {
        /// The attribute that is set.
        present: &'static str,
        /// The attribute that is missing.
        missing: &'static str,
    },

    /// A tenant was given without a username/password pair.
    #[error("tenant_subdomain requires username and password")]
    TenantWithoutPassword,
}

impl ProviderError {
    /// The attribute this error is about, if any.
    #[must_use]
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            Self::InvalidType { attribute, .. } | Self::MissingAttribute { attribute, .. } => {
                Some(attribute)
            },
            Self::InvalidUrl { .. } => Some("url"),
            Self::IncompletePassword { missing, .. } => Some(missing),
            Self::TenantWithoutPassword => Some("tenant_subdomain"),
            Self::NotAnObject(_) | Self::MissingCredentials => None,
        }
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(e: ProviderError) -> Self {
        let diagnostic = Diagnostic::error("Invalid provider configuration").with_detail(e.to_string());
        match e.attribute() {
            Some(attribute) => diagnostic.with_attribute(attribute),
            None => diagnostic,
        }
    }
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_carries_attribute() {
        let d: Diagnostic = ProviderError::InvalidType {
            attribute: "username",
            found: "number",
        }
        .into();
        assert!(d.is_error());
        assert_eq!(d.attribute.as_deref(), Some("username"));
        assert_eq!(
            d.detail.as_deref(),
            Some("attribute username must be a string, got number")
        );
    }

    #[test]
    fn missing_credentials_has_no_attribute() {
        let d: Diagnostic = ProviderError::MissingCredentials.into();
        assert!(d.attribute.is_none());
    }
}
