//! JSON documents exchanged with the calling process.
//!
//! Every invocation answers with one of two envelope shapes:
//!
//! - `{"status": "success", ...data}` via [`Success`]
//! - `{"status": "error", "error": <kind>, "message": ...}` via [`ErrorEnvelope`]
//!
//! The authorization flow additionally emits [`Step`] documents so the caller
//! can show an authorization URL or capture a newly minted token.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of every failure the CLI can report.
///
/// The serialized (snake_case) form is what appears in the `error` field of
/// an [`ErrorEnvelope`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The HTTP/TLS stack could not be initialized.
    MissingDependency,
    /// OAuth client id or secret is not configured.
    MissingCredentials,
    /// The token blob could not be parsed.
    InvalidToken,
    /// The authorization flow failed, was denied, or timed out.
    OauthFailed,
    /// Exchanging the refresh token for a new access token failed.
    RefreshFailed,
    /// A date/time argument is not valid ISO-8601.
    InvalidTimeFormat,
    /// A required command-line option was not supplied.
    MissingRequiredArgument,
    /// The Calendar API or the transport to it returned an error.
    RemoteApiError,
    /// Anything else.
    UnexpectedError,
}

impl ErrorKind {
    /// Returns the wire name of this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingDependency => "missing_dependency",
            Self::MissingCredentials => "missing_credentials",
            Self::InvalidToken => "invalid_token",
            Self::OauthFailed => "oauth_failed",
            Self::RefreshFailed => "refresh_failed",
            Self::InvalidTimeFormat => "invalid_time_format",
            Self::MissingRequiredArgument => "missing_required_argument",
            Self::RemoteApiError => "remote_api_error",
            Self::UnexpectedError => "unexpected_error",
        }
    }

    /// Returns true if this error aborts the invocation before any operation
    /// result exists. Fatal errors are written to stderr.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingDependency
                | Self::MissingCredentials
                | Self::MissingRequiredArgument
                | Self::OauthFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value of the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// A successful result: `status` followed by the flattened payload.
#[derive(Debug, Clone, Serialize)]
pub struct Success<T: Serialize> {
    status: Status,
    #[serde(flatten)]
    data: T,
}

impl<T: Serialize> Success<T> {
    /// Wraps a payload into a success envelope.
    pub fn new(data: T) -> Self {
        Self {
            status: Status::Success,
            data,
        }
    }
}

/// An error result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: Status,
    pub error: ErrorKind,
    pub message: String,
    /// Remediation hint for the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

impl ErrorEnvelope {
    /// Creates an error envelope of the given kind.
    pub fn new(error: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            error,
            message: message.into(),
            instructions: None,
        }
    }

    /// Attaches a remediation hint.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }
}

/// Progress documents emitted by the authorization flow on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// The user must open `url` and grant access.
    Authorize { url: String, message: String },
    /// An expired access token was renewed; `token` must be stored again.
    TokenRefreshed {
        token: serde_json::Value,
        message: String,
    },
    /// A fresh authorization finished; `token` must be stored.
    Complete {
        token: serde_json::Value,
        message: String,
    },
}

/// Renders a document as indented JSON.
///
/// Non-ASCII characters are kept verbatim.
pub fn render_pretty<T: Serialize>(doc: &T) -> String {
    serde_json::to_string_pretty(doc).unwrap_or_else(|e| serialization_failure(&e))
}

/// Renders a document as a single JSON line.
pub fn render_line<T: Serialize>(doc: &T) -> String {
    serde_json::to_string(doc).unwrap_or_else(|e| serialization_failure(&e))
}

fn serialization_failure(err: &serde_json::Error) -> String {
    serde_json::json!({
        "status": "error",
        "error": ErrorKind::UnexpectedError,
        "message": format!("failed to serialize output: {}", err),
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_wire_names() {
        assert_eq!(ErrorKind::OauthFailed.as_str(), "oauth_failed");
        assert_eq!(
            serde_json::to_value(ErrorKind::MissingRequiredArgument).unwrap(),
            serde_json::json!("missing_required_argument")
        );
        assert_eq!(
            serde_json::to_value(ErrorKind::RemoteApiError).unwrap(),
            serde_json::json!(ErrorKind::RemoteApiError.as_str())
        );
    }

    #[test]
    fn fatal_kinds() {
        assert!(ErrorKind::MissingCredentials.is_fatal());
        assert!(ErrorKind::OauthFailed.is_fatal());
        assert!(!ErrorKind::RemoteApiError.is_fatal());
        assert!(!ErrorKind::InvalidTimeFormat.is_fatal());
        assert!(!ErrorKind::RefreshFailed.is_fatal());
    }

    #[test]
    fn error_envelope_shape() {
        let envelope = ErrorEnvelope::new(
            ErrorKind::MissingCredentials,
            "GOOGLE_CALENDAR_CLIENT_ID and GOOGLE_CALENDAR_CLIENT_SECRET are required",
        );
        insta::assert_json_snapshot!(envelope, @r###"
        {
          "status": "error",
          "error": "missing_credentials",
          "message": "GOOGLE_CALENDAR_CLIENT_ID and GOOGLE_CALENDAR_CLIENT_SECRET are required"
        }
        "###);
    }

    #[test]
    fn success_flattens_payload() {
        #[derive(Serialize)]
        struct Deleted {
            message: String,
        }

        let doc = Success::new(Deleted {
            message: "Event abc deleted".to_string(),
        });
        insta::assert_json_snapshot!(doc, @r###"
        {
          "status": "success",
          "message": "Event abc deleted"
        }
        "###);
    }

    #[test]
    fn step_is_tagged() {
        let step = Step::Authorize {
            url: "https://accounts.google.com/o/oauth2/v2/auth?x=1".to_string(),
            message: "open this link".to_string(),
        };
        let value = serde_json::to_value(&step).unwrap();
        assert_eq!(value["step"], "authorize");
        assert_eq!(value["url"], "https://accounts.google.com/o/oauth2/v2/auth?x=1");
    }

    #[test]
    fn render_keeps_non_ascii() {
        let envelope = ErrorEnvelope::new(ErrorKind::RemoteApiError, "Reunião não encontrada");
        let line = render_line(&envelope);
        assert!(line.contains("Reunião não encontrada"));
        let pretty = render_pretty(&envelope);
        assert!(pretty.contains("\n  \"error\": \"remote_api_error\""));
    }

    #[test]
    fn instructions_are_optional() {
        let plain = serde_json::to_value(ErrorEnvelope::new(ErrorKind::InvalidToken, "bad")).unwrap();
        assert!(plain.get("instructions").is_none());

        let hinted = serde_json::to_value(
            ErrorEnvelope::new(ErrorKind::MissingCredentials, "missing").with_instructions("set them"),
        )
        .unwrap();
        assert_eq!(hinted["instructions"], "set them");
    }
}
