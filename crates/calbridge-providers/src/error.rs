//! Error types for Google OAuth and Calendar API operations.

use std::fmt;
use thiserror::Error;

/// What went wrong while talking to Google.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The token endpoint refused a grant, or the API answered 401.
    AuthenticationFailed,
    /// 403 from the Calendar API.
    AuthorizationFailed,
    /// The request never got an HTTP answer.
    NetworkError,
    /// 429 from the Calendar API.
    RateLimited,
    /// 5xx, or any other unexpected status.
    ServerError,
    /// A success response whose body could not be decoded.
    InvalidResponse,
    /// 404 or 410: the event or calendar does not exist.
    NotFound,
    /// 400: Google rejected the request body or parameters.
    BadRequest,
    /// The supplied token JSON or client settings are unusable.
    ConfigurationError,
    /// The HTTP/TLS stack could not be set up.
    DependencyUnavailable,
    /// A local failure (socket, stdin, channel) unrelated to Google.
    InternalError,
}

impl ProviderErrorCode {
    /// Stable snake_case name, used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::DependencyUnavailable => "dependency_unavailable",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error that occurred while talking to Google.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// HTTP status returned by Google, when the error came from a response.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new provider error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Creates an error for an unusable HTTP/TLS stack.
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::DependencyUnavailable, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Classifies a non-success HTTP response.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            400 => ProviderErrorCode::BadRequest,
            401 => ProviderErrorCode::AuthenticationFailed,
            403 => ProviderErrorCode::AuthorizationFailed,
            404 | 410 => ProviderErrorCode::NotFound,
            429 => ProviderErrorCode::RateLimited,
            _ => ProviderErrorCode::ServerError,
        };
        let mut err = Self::new(code, message);
        err.status = Some(status);
        err
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (HTTP {}): {}", self.code, status, self.message),
            None => write!(f, "{}: {}", self.code, self.message),
        }
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_classification() {
        assert_eq!(
            ProviderError::from_status(404, "gone").code(),
            ProviderErrorCode::NotFound
        );
        assert_eq!(
            ProviderError::from_status(401, "x").code(),
            ProviderErrorCode::AuthenticationFailed
        );
        assert_eq!(
            ProviderError::from_status(503, "x").code(),
            ProviderErrorCode::ServerError
        );
        assert_eq!(
            ProviderError::from_status(410, "x").code(),
            ProviderErrorCode::NotFound
        );
        assert_eq!(
            ProviderError::from_status(429, "x").code(),
            ProviderErrorCode::RateLimited
        );
        assert_eq!(
            ProviderError::from_status(400, "x").to_string(),
            "bad_request (HTTP 400): x"
        );
    }

    #[test]
    fn display_includes_status() {
        let err = ProviderError::from_status(404, "Not Found");
        assert_eq!(err.to_string(), "not_found (HTTP 404): Not Found");

        let err = ProviderError::network("connection reset");
        assert_eq!(err.to_string(), "network_error: connection reset");
    }

    #[test]
    fn provider_error_with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("broken pipe");
        let err = ProviderError::internal("failed to read callback").with_source(io_err);
        assert!(err.source().is_some());
    }
}
