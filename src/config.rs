//! Provider configuration.
//!
//! The provider block names the directory server to manage and the
//! credentials used against its configuration API.

use crate::error::ProviderError;
use crate::schema::{FieldDescriptor, ResourceSchema};
use crate::validation::validate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Product version assumed when the configuration does not name one.
pub const DEFAULT_PRODUCT_VERSION: &str = "9.3.0.0";

fn default_product_version() -> String {
    DEFAULT_PRODUCT_VERSION.to_string()
}

/// Parsed provider configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the configuration API. Must use `https://`.
    pub https_host: String,
    /// Username for basic authentication.
    #[serde(default)]
    pub username: Option<String>,
    /// Password for basic authentication.
    #[serde(default)]
    pub password: Option<String>,
    /// Skip certificate verification.
    #[serde(default)]
    pub insecure_trust_all_certificates: bool,
    /// Version of the directory server being managed.
    #[serde(default = "default_product_version")]
    pub product_version: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("https_host", &self.https_host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "(sensitive)"))
            .field(
                "insecure_trust_all_certificates",
                &self.insecure_trust_all_certificates,
            )
            .field("product_version", &self.product_version)
            .finish()
    }
}

impl ProviderConfig {
    /// Schema of the provider block.
    pub fn schema() -> ResourceSchema {
        ResourceSchema::v0()
            .with_field(
                FieldDescriptor::required_string("https_host")
                    .with_description("URI for the directory server's HTTPS interface"),
            )
            .with_field(FieldDescriptor::optional_string("username"))
            .with_field(FieldDescriptor::optional_string("password").sensitive())
            .with_field(FieldDescriptor::optional_bool("insecure_trust_all_certificates"))
            .with_field(FieldDescriptor::optional_string("product_version"))
    }

    /// Validate and parse a provider block.
    ///
    /// Attributes set to `null` are treated as unset and take their defaults.
    pub fn from_value(mut value: Value) -> Result<Self, ProviderError> {
        let diagnostics = validate(&Self::schema(), &value);
        if let Some(first) = diagnostics.iter().find(|d| d.is_error()) {
            return Err(ProviderError::Configuration(first.summary.clone()));
        }

        if let Some(obj) = value.as_object_mut() {
            obj.retain(|_, v| !v.is_null());
        }
        let config: Self = serde_json::from_value(value)
            .map_err(|e| ProviderError::Configuration(e.to_string()))?;

        if !config.https_host.starts_with("https://") {
            return Err(ProviderError::Configuration(format!(
                "https_host must start with https://, got '{}'",
                config.https_host
            )));
        }
        if config.username.is_some() != config.password.is_some() {
            return Err(ProviderError::Configuration(
                "username and password must be set together".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_defaults() {
        let config = ProviderConfig::from_value(json!({"https_host": "https://localhost:1443"}))
            .unwrap();
        assert_eq!(config.product_version, DEFAULT_PRODUCT_VERSION);
        assert!(!config.insecure_trust_all_certificates);
        assert!(config.username.is_none());
    }

    #[test]
    fn test_from_value_null_takes_default() {
        let config = ProviderConfig::from_value(json!({
            "https_host": "https://localhost:1443",
            "product_version": null,
            "insecure_trust_all_certificates": null,
            "username": null,
            "password": null
        }))
        .unwrap();
        assert_eq!(config.product_version, DEFAULT_PRODUCT_VERSION);
        assert!(!config.insecure_trust_all_certificates);
        assert!(config.password.is_none());
    }

    #[test]
    fn test_from_value_requires_host() {
        let err = ProviderConfig::from_value(json!({})).unwrap_err();
        assert!(matches!(err, ProviderError::Configuration(_)));
        assert!(err.message().contains("https_host"));
    }

    #[test]
    fn test_from_value_rejects_plain_http() {
        let err = ProviderConfig::from_value(json!({"https_host": "http://localhost"})).unwrap_err();
        assert!(err.message().contains("https://"));
    }

    #[test]
    fn test_credentials_must_be_paired() {
        let err = ProviderConfig::from_value(json!({
            "https_host": "https://localhost",
            "username": "cn=admin"
        }))
        .unwrap_err();
        assert!(err.message().contains("together"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = ProviderConfig::from_value(json!({
            "https_host": "https://localhost",
            "username": "cn=admin",
            "password": "hunter2"
        }))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("(sensitive)"));
    }
}
