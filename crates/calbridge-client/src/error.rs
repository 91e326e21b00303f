//! Client error types.

use std::process::ExitCode;

use calbridge_core::{ErrorEnvelope, ErrorKind, TimeParseError};
use calbridge_providers::{ProviderError, ProviderErrorCode};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end an invocation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The OAuth client id or secret is not configured.
    #[error("{0}")]
    MissingCredentials(String),

    /// A required option was not given for the action.
    #[error("{0}")]
    MissingArgument(String),

    /// A date/time option could not be parsed.
    #[error(transparent)]
    InvalidTime(#[from] TimeParseError),

    /// The authorization flow failed.
    #[error("authorization failed: {0}")]
    Authorization(#[source] ProviderError),

    /// The HTTP/TLS stack is unusable.
    #[error("HTTP client unavailable: {0}")]
    Dependency(#[source] ProviderError),

    /// The Calendar API or the transport failed.
    #[error("{0}")]
    Remote(#[source] ProviderError),

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl ClientError {
    /// Returns the error kind reported to the caller.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials(_) => ErrorKind::MissingCredentials,
            Self::MissingArgument(_) => ErrorKind::MissingRequiredArgument,
            Self::InvalidTime(_) => ErrorKind::InvalidTimeFormat,
            Self::Authorization(_) => ErrorKind::OauthFailed,
            Self::Dependency(_) => ErrorKind::MissingDependency,
            Self::Remote(_) => ErrorKind::RemoteApiError,
            Self::Unexpected(_) => ErrorKind::UnexpectedError,
        }
    }

    /// Exit status of an invocation that ended with this error.
    ///
    /// Operation errors are a result like any other and exit 0 with their
    /// document on stdout; fatal errors exit 1.
    pub fn exit_code(&self) -> ExitCode {
        if self.kind().is_fatal() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }

    /// Builds the error document.
    pub fn envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.kind(), self.to_string());
        match self {
            Self::MissingCredentials(_) => envelope.with_instructions(
                "Set GOOGLE_CALENDAR_CLIENT_ID and GOOGLE_CALENDAR_CLIENT_SECRET before running calbridge",
            ),
            Self::Dependency(_) => envelope.with_instructions(
                "The TLS/HTTP stack could not be initialized; check the system certificate store",
            ),
            _ => envelope,
        }
    }
}

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        match err.code() {
            ProviderErrorCode::InternalError => Self::Unexpected(err.to_string()),
            ProviderErrorCode::DependencyUnavailable => Self::Dependency(err),
            _ => Self::Remote(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_classified() {
        let err: ClientError = ProviderError::from_status(404, "Not Found").into();
        assert_eq!(err.kind(), ErrorKind::RemoteApiError);
        assert_eq!(err.to_string(), "not_found (HTTP 404): Not Found");

        let err: ClientError = ProviderError::network("request timeout").into();
        assert_eq!(err.kind(), ErrorKind::RemoteApiError);

        let err: ClientError = ProviderError::internal("bug").into();
        assert_eq!(err.kind(), ErrorKind::UnexpectedError);

        let err: ClientError = ProviderError::dependency("no TLS").into();
        assert_eq!(err.kind(), ErrorKind::MissingDependency);
    }

    #[test]
    fn authorization_errors_are_oauth_failed() {
        let err = ClientError::Authorization(ProviderError::authentication("access_denied"));
        assert_eq!(err.kind(), ErrorKind::OauthFailed);
        assert!(err.kind().is_fatal());
    }

    #[test]
    fn time_errors() {
        let err: ClientError = TimeParseError {
            input: "tomorrow".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidTimeFormat);
        assert!(!err.kind().is_fatal());
        assert!(err.to_string().contains("'tomorrow'"));
    }

    #[test]
    fn only_fatal_errors_fail_the_process() {
        let invalid_time: ClientError = TimeParseError {
            input: "bad".to_string(),
        }
        .into();
        assert_eq!(invalid_time.exit_code(), ExitCode::SUCCESS);

        let remote: ClientError = ProviderError::from_status(500, "backend").into();
        assert_eq!(remote.exit_code(), ExitCode::SUCCESS);

        let missing = ClientError::MissingArgument("--event-id is required".into());
        assert_eq!(missing.exit_code(), ExitCode::FAILURE);

        let oauth = ClientError::Authorization(ProviderError::authentication("timeout"));
        assert_eq!(oauth.exit_code(), ExitCode::FAILURE);
    }

    #[test]
    fn missing_credentials_envelope() {
        let envelope = ClientError::MissingCredentials("client id missing".into()).envelope();
        insta::assert_json_snapshot!(envelope, @r#"
        {
          "status": "error",
          "error": "missing_credentials",
          "message": "client id missing",
          "instructions": "Set GOOGLE_CALENDAR_CLIENT_ID and GOOGLE_CALENDAR_CLIENT_SECRET before running calbridge"
        }
        "#);
    }
}
