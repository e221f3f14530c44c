//! Error types for gateway operations.
//!
//! Every failure the gateway can produce is a variant of [`Error`]. A variant knows the HTTP
//! status it maps to, the operation label it is counted under in the error metric, and the
//! summary message placed in the response envelope.

use thiserror::Error;

use crate::query::ValidationError;

/// Main error type for gateway operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// None of the configured directory hosts accepted a connection
    #[error("unable to open connection to directory")]
    DirectoryUnreachable,

    /// The directory rejected the bind, or the bind failed at protocol level
    #[error("Directory bind failed: {0}")]
    DirectoryBindFailed(String),

    /// The directory search failed at protocol level
    #[error("Directory search failed: {0}")]
    SearchFailed(String),

    /// One or more query fields failed validation
    #[error("Validation failed: {} violation(s)", .0.len())]
    ValidationFailed(Vec<ValidationError>),

    /// The request body could not be read
    #[error("Request body unreadable: {0}")]
    RequestUnreadable(String),

    /// The request body could not be decoded
    #[error("Request malformed: {0}")]
    RequestMalformed(String),

    /// A trace identifier could not be generated
    #[error("Trace ID generation failed: {0}")]
    TraceGenerationFailed(String),

    /// The client address is not in the allow-list
    #[error("Source not allowed: {0}")]
    SourceNotAllowed(String),

    /// The request used a method other than POST
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// The transport-level remote address was not available
    #[error("Client address unavailable: {0}")]
    ClientAddressUnavailable(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Specialized result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DirectoryUnreachable => "DIRECTORY_UNREACHABLE",
            Self::DirectoryBindFailed(_) => "DIRECTORY_BIND_FAILED",
            Self::SearchFailed(_) => "SEARCH_FAILED",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::RequestUnreadable(_) => "REQUEST_UNREADABLE",
            Self::RequestMalformed(_) => "REQUEST_MALFORMED",
            Self::TraceGenerationFailed(_) => "TRACE_GENERATION_FAILED",
            Self::SourceNotAllowed(_) => "SOURCE_NOT_ALLOWED",
            Self::MethodNotAllowed(_) => "METHOD_NOT_ALLOWED",
            Self::ClientAddressUnavailable(_) => "CLIENT_ADDRESS_UNAVAILABLE",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status code returned to the caller.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::ValidationFailed(_) => 400,
            Self::SourceNotAllowed(_) => 401,
            Self::MethodNotAllowed(_) => 405,
            Self::DirectoryUnreachable
            | Self::DirectoryBindFailed(_)
            | Self::SearchFailed(_)
            | Self::RequestUnreadable(_)
            | Self::RequestMalformed(_)
            | Self::TraceGenerationFailed(_)
            | Self::ClientAddressUnavailable(_)
            | Self::ConfigError(_)
            | Self::InternalError(_) => 500,
        }
    }

    /// Operation label used when counting this error.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed(_) => "method",
            Self::ClientAddressUnavailable(_) => "client_ip",
            Self::SourceNotAllowed(_) => "source",
            Self::TraceGenerationFailed(_) => "trace_id",
            Self::DirectoryUnreachable | Self::DirectoryBindFailed(_) => "bind",
            Self::RequestUnreadable(_) => "decode",
            Self::RequestMalformed(_) => "parse",
            Self::ValidationFailed(_) => "validate",
            Self::SearchFailed(_) => "search",
            Self::ConfigError(_) => "config",
            Self::InternalError(_) => "internal",
        }
    }

    /// Summary placed in the `message` field of the response envelope.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::DirectoryUnreachable | Self::DirectoryBindFailed(_) => {
                "unable to bind to directory".to_string()
            }
            Self::SearchFailed(_) => "unable to search LDAP".to_string(),
            Self::ValidationFailed(_) => "error(s) when validating incoming query".to_string(),
            Self::RequestUnreadable(_) => "unable to read HTTP request body".to_string(),
            Self::RequestMalformed(_) => "unable to decode JSON query payload".to_string(),
            Self::TraceGenerationFailed(_) => "unable to generate trace ID".to_string(),
            Self::SourceNotAllowed(ip) => format!("{ip} is not allowed to query; check the config"),
            Self::MethodNotAllowed(method) => format!("method {method} is not allowed"),
            Self::ClientAddressUnavailable(_) => "unable to retrieve remote address".to_string(),
            Self::ConfigError(_) => "invalid configuration".to_string(),
            Self::InternalError(_) => "internal error".to_string(),
        }
    }

    /// Raw error text placed in the `error` field of the response envelope, if any.
    ///
    /// Backend error detail is surfaced to callers as-is.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::DirectoryUnreachable => Some(self.to_string()),
            Self::DirectoryBindFailed(message)
            | Self::SearchFailed(message)
            | Self::RequestUnreadable(message)
            | Self::RequestMalformed(message)
            | Self::TraceGenerationFailed(message)
            | Self::ClientAddressUnavailable(message)
            | Self::ConfigError(message)
            | Self::InternalError(message) => Some(message.clone()),
            Self::ValidationFailed(_) | Self::SourceNotAllowed(_) | Self::MethodNotAllowed(_) => {
                None
            }
        }
    }

    /// Returns true if this error should be logged as a serious error.
    #[must_use]
    pub const fn should_log(&self) -> bool {
        matches!(
            self,
            Self::DirectoryUnreachable
                | Self::DirectoryBindFailed(_)
                | Self::SearchFailed(_)
                | Self::TraceGenerationFailed(_)
                | Self::ClientAddressUnavailable(_)
                | Self::ConfigError(_)
                | Self::InternalError(_)
        )
    }
}

// Conversions from external error types
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::RequestMalformed(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::ValidationFailed(Vec::new()).status_code(), 400);
        assert_eq!(
            Error::SourceNotAllowed("10.0.0.1".to_string()).status_code(),
            401
        );
        assert_eq!(
            Error::MethodNotAllowed("GET".to_string()).status_code(),
            405
        );
        assert_eq!(Error::DirectoryUnreachable.status_code(), 500);
        assert_eq!(
            Error::DirectoryBindFailed("Invalid Credentials".to_string()).status_code(),
            500
        );
        assert_eq!(
            Error::SearchFailed("No Such Object".to_string()).status_code(),
            500
        );
        assert_eq!(
            Error::RequestMalformed("eof".to_string()).status_code(),
            500
        );
        assert_eq!(
            Error::TraceGenerationFailed("entropy".to_string()).status_code(),
            500
        );
    }

    #[test]
    fn test_operation_labels() {
        assert_eq!(Error::DirectoryUnreachable.operation(), "bind");
        assert_eq!(Error::DirectoryBindFailed(String::new()).operation(), "bind");
        assert_eq!(Error::RequestUnreadable(String::new()).operation(), "decode");
        assert_eq!(Error::RequestMalformed(String::new()).operation(), "parse");
        assert_eq!(Error::ValidationFailed(Vec::new()).operation(), "validate");
        assert_eq!(Error::SearchFailed(String::new()).operation(), "search");
        assert_eq!(Error::SourceNotAllowed(String::new()).operation(), "source");
        assert_eq!(Error::MethodNotAllowed(String::new()).operation(), "method");
        assert_eq!(
            Error::TraceGenerationFailed(String::new()).operation(),
            "trace_id"
        );
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            Error::DirectoryUnreachable.error_code(),
            "DIRECTORY_UNREACHABLE"
        );
        assert_eq!(
            Error::SearchFailed("x".to_string()).error_code(),
            "SEARCH_FAILED"
        );
        assert_eq!(
            Error::ConfigError("x".to_string()).error_code(),
            "CONFIG_ERROR"
        );
    }

    #[test]
    fn test_summary_and_detail() {
        let err = Error::SourceNotAllowed("192.0.2.7".to_string());
        assert_eq!(
            err.summary(),
            "192.0.2.7 is not allowed to query; check the config"
        );
        assert!(err.detail().is_none());

        let err = Error::DirectoryBindFailed("Invalid Credentials".to_string());
        assert_eq!(err.summary(), "unable to bind to directory");
        assert_eq!(err.detail().as_deref(), Some("Invalid Credentials"));

        let err = Error::DirectoryUnreachable;
        assert_eq!(
            err.detail().as_deref(),
            Some("unable to open connection to directory")
        );
    }

    #[test]
    fn test_should_log() {
        assert!(Error::DirectoryUnreachable.should_log());
        assert!(Error::SearchFailed("x".to_string()).should_log());
        assert!(!Error::ValidationFailed(Vec::new()).should_log());
        assert!(!Error::SourceNotAllowed("x".to_string()).should_log());
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let gateway_err: Error = err.into();
        assert!(matches!(gateway_err, Error::RequestMalformed(_)));
        assert_eq!(gateway_err.operation(), "parse");
    }

    #[test]
    fn test_error_display() {
        let err = Error::SearchFailed("No Such Object".to_string());
        assert_eq!(err.to_string(), "Directory search failed: No Such Object");
    }
}
