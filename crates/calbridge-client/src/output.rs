//! Writing JSON documents to the calling process.
//!
//! stdout carries results and authorization steps; stderr carries warnings
//! and fatal errors. Steps are single lines so the caller can act on them
//! while the process is still waiting for input.

use std::io::Write;

use calbridge_core::{ErrorEnvelope, ErrorKind, Step, Success, render_line, render_pretty};
use calbridge_providers::ProviderError;
use calbridge_providers::google::{AuthReporter, Credential};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Wraps a payload into a success document.
pub fn success<T: Serialize>(payload: T) -> ClientResult<Value> {
    serde_json::to_value(Success::new(payload))
        .map_err(|e| ClientError::Unexpected(format!("failed to serialize result: {}", e)))
}

/// Prints a result document on stdout.
pub fn print_result(doc: &Value) {
    println!("{}", render_pretty(doc));
}

/// Prints an error where its kind belongs: fatal errors on stderr,
/// operation errors on stdout.
pub fn print_error(err: &ClientError) {
    let rendered = render_pretty(&err.envelope());
    if err.kind().is_fatal() {
        eprintln!("{}", rendered);
    } else {
        println!("{}", rendered);
    }
}

/// Prints a non-fatal warning on stderr.
pub fn print_warning(kind: ErrorKind, message: impl Into<String>) {
    eprintln!("{}", render_line(&ErrorEnvelope::new(kind, message)));
}

fn print_step(step: &Step) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{}", render_line(step));
    let _ = stdout.flush();
}

/// Reports authorization progress as JSON documents.
#[derive(Debug, Default)]
pub struct JsonReporter;

impl JsonReporter {
    pub fn authorize_step(url: &str) -> Step {
        Step::Authorize {
            url: url.to_string(),
            message: "Open this link to authorize access to Google Calendar, then paste the \
                      authorization code or the redirected URL"
                .to_string(),
        }
    }

    pub fn refreshed_step(credential: &Credential) -> Step {
        Step::TokenRefreshed {
            token: credential.to_json_value(),
            message: "Token refreshed automatically. Update GOOGLE_CALENDAR_TOKEN_JSON with the \
                      token above."
                .to_string(),
        }
    }

    pub fn complete_step(credential: &Credential) -> Step {
        Step::Complete {
            token: credential.to_json_value(),
            message: "Authorization complete. Store the token above in \
                      GOOGLE_CALENDAR_TOKEN_JSON."
                .to_string(),
        }
    }
}

impl AuthReporter for JsonReporter {
    fn authorize_url(&self, url: &str) {
        print_step(&Self::authorize_step(url));
    }

    fn token_refreshed(&self, credential: &Credential) {
        print_step(&Self::refreshed_step(credential));
    }

    fn refresh_failed(&self, error: &ProviderError) {
        print_warning(
            ErrorKind::RefreshFailed,
            format!(
                "token refresh failed: {}; a new authorization is required",
                error
            ),
        );
    }

    fn authorization_complete(&self, credential: &Credential) {
        print_step(&Self::complete_step(credential));
    }
}
