//! Error types for the directory configuration provider SDK.

use crate::schema::Diagnostic;
use thiserror::Error;

/// Errors that can occur when implementing a provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The requested configuration object was not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// The configuration object already exists (create conflict).
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// The remote store rejected an update because of a concurrent change.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A validation error occurred.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An enum attribute held a value outside its accepted set.
    #[error("Unrecognized value '{value}' for attribute '{attribute}'")]
    UnrecognizedEnumValue {
        /// The attribute that held the value.
        attribute: String,
        /// The rejected value.
        value: String,
    },

    /// The requested resource type is unknown.
    #[error("Unknown resource type: {0}")]
    UnknownResource(String),

    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The remote store received a malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The remote store is temporarily unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// An internal SDK error occurred.
    #[error("SDK error: {0}")]
    Sdk(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProviderError {
    /// Get the error message as a string.
    ///
    /// Returns a reference to the error message for any variant.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(msg) => msg,
            Self::AlreadyExists(msg) => msg,
            Self::Conflict(msg) => msg,
            Self::Validation(msg) => msg,
            Self::UnrecognizedEnumValue { value, .. } => value,
            Self::UnknownResource(msg) => msg,
            Self::Configuration(msg) => msg,
            Self::InvalidRequest(msg) => msg,
            Self::Unavailable(msg) => msg,
            Self::Sdk(msg) => msg,
            Self::Serialization(_err) => "serialization error (see Debug output)",
        }
    }

    /// Whether this error reports a missing remote object.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<ProviderError> for Diagnostic {
    fn from(err: ProviderError) -> Self {
        let diagnostic = Diagnostic::error(err.to_string());
        match err {
            ProviderError::UnrecognizedEnumValue { attribute, .. } => {
                diagnostic.with_attribute(attribute)
            },
            _ => diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::DiagnosticSeverity;

    #[test]
    fn test_error_display() {
        let err = ProviderError::NotFound("console-json-error-log-publisher/main".to_string());
        assert_eq!(
            format!("{}", err),
            "Resource not found: console-json-error-log-publisher/main"
        );

        let err = ProviderError::Validation("invalid input".to_string());
        assert_eq!(format!("{}", err), "Validation error: invalid input");

        let err = ProviderError::Conflict("object changed".to_string());
        assert_eq!(format!("{}", err), "Conflict: object changed");

        let err = ProviderError::UnknownResource("custom_resource".to_string());
        assert_eq!(format!("{}", err), "Unknown resource type: custom_resource");
    }

    #[test]
    fn test_unrecognized_enum_value_display() {
        let err = ProviderError::UnrecognizedEnumValue {
            attribute: "output_location".to_string(),
            value: "printer".to_string(),
        };
        assert_eq!(
            format!("{}", err),
            "Unrecognized value 'printer' for attribute 'output_location'"
        );
        assert_eq!(err.message(), "printer");
    }

    #[test]
    fn test_message_method() {
        let err = ProviderError::NotFound("resource-123".to_string());
        assert_eq!(err.message(), "resource-123");

        let err = ProviderError::Configuration("invalid config".to_string());
        assert_eq!(err.message(), "invalid config");

        let err = ProviderError::InvalidRequest("bad request".to_string());
        assert_eq!(err.message(), "bad request");
    }

    #[test]
    fn test_is_not_found() {
        assert!(ProviderError::NotFound("x".to_string()).is_not_found());
        assert!(!ProviderError::Conflict("x".to_string()).is_not_found());
    }

    #[test]
    fn test_error_to_diagnostic() {
        let diagnostic: Diagnostic = ProviderError::UnrecognizedEnumValue {
            attribute: "default_severity".to_string(),
            value: "loud".to_string(),
        }
        .into();
        assert_eq!(diagnostic.severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostic.attribute, Some("default_severity".to_string()));

        let diagnostic: Diagnostic = ProviderError::Unavailable("down".to_string()).into();
        assert_eq!(diagnostic.summary, "Service unavailable: down");
        assert!(diagnostic.attribute.is_none());
    }
}
