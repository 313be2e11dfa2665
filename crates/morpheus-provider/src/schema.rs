//! Provider configuration schema.

use morpheus_plugin::{Attribute, ProviderSchema, Schema};

/// API base URL.
pub const URL: &str = "url";
/// Username for password authentication.
pub const USERNAME: &str = "username";
/// Password for password authentication.
pub const PASSWORD: &str = "password";
/// Pre-issued API access token.
pub const ACCESS_TOKEN: &str = "access_token";
/// Subdomain of a sub-tenant to log in to.
pub const TENANT_SUBDOMAIN: &str = "tenant_subdomain";

/// Each attribute and the environment variable supplying its default.
pub const ENV_DEFAULTS: [(&str, &str); 5] = [
    (URL, "MORPHEUS_API_URL"),
    (USERNAME, "MORPHEUS_API_USERNAME"),
    (PASSWORD, "MORPHEUS_API_PASSWORD"),
    (ACCESS_TOKEN, "MORPHEUS_API_TOKEN"),
    (TENANT_SUBDOMAIN, "MORPHEUS_API_TENANT"),
];

/// Environment variable backing `attribute`.
#[must_use]
pub fn env_var_for(attribute: &str) -> Option<&'static str> {
    ENV_DEFAULTS
        .iter()
        .find(|(name, _)| *name == attribute)
        .map(|(_, env)| *env)
}

/// The provider's schema. The provider exposes no resources or data sources.
#[must_use]
pub fn provider_schema() -> ProviderSchema {
    let provider = Schema::v0()
        .with_description("Configuration for the Morpheus provider.")
        .with_attribute(
            URL,
            Attribute::required_string()
                .with_description("URL of the Morpheus appliance. Defaults to MORPHEUS_API_URL."),
        )
        .with_attribute(
            USERNAME,
            Attribute::optional_string().with_description("Username for password authentication."),
        )
        .with_attribute(
            PASSWORD,
            Attribute::optional_string()
                .sensitive()
                .with_description("Password for password authentication."),
        )
        .with_attribute(
            ACCESS_TOKEN,
            Attribute::optional_string()
                .sensitive()
                .with_description("Access token. Takes precedence over username and password."),
        )
        .with_attribute(
            TENANT_SUBDOMAIN,
            Attribute::optional_string()
                .with_description("Sub-tenant to authenticate against. Requires username and password."),
        );

    ProviderSchema::new(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_every_attribute() {
        let schema = provider_schema();
        for (name, _) in ENV_DEFAULTS {
            assert!(schema.provider.attributes.contains_key(name), "missing {name}");
        }
        assert_eq!(schema.provider.attributes.len(), ENV_DEFAULTS.len());
        assert!(schema.resource_schemas.is_empty());
        assert!(schema.data_source_schemas.is_empty());
        assert!(schema.diagnostics.is_empty());
    }

    #[test]
    fn secrets_are_sensitive() {
        let schema = provider_schema();
        assert!(schema.provider.attributes[PASSWORD].sensitive);
        assert!(schema.provider.attributes[ACCESS_TOKEN].sensitive);
        assert!(!schema.provider.attributes[USERNAME].sensitive);
    }

    #[test]
    fn only_url_is_required() {
        let schema = provider_schema();
        let required: Vec<&str> = schema.provider.required_attributes().collect();
        assert_eq!(required, vec![URL]);
    }

    #[test]
    fn env_var_lookup() {
        assert_eq!(env_var_for(ACCESS_TOKEN), Some("MORPHEUS_API_TOKEN"));
        assert_eq!(env_var_for("nope"), None);
    }
}
