//! Authentication command.
//!
//! Obtaining the credential is shared with every other action; this command
//! only decides what to print afterwards. A refreshed or newly authorized
//! token has already been emitted as a step document, so nothing else is
//! printed in those cases.

use calbridge_providers::google::{AuthOutcome, CredentialSource};
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientResult;
use crate::output::success;

#[derive(Debug, Serialize)]
pub struct AuthStatus {
    pub message: String,
    pub expiry: Option<String>,
}

/// Builds the result of the `auth` action.
pub fn report(outcome: &AuthOutcome) -> ClientResult<Option<Value>> {
    if outcome.source != CredentialSource::Existing {
        return Ok(None);
    }

    let expiry = outcome
        .credential
        .to_json_value()
        .get("expiry")
        .and_then(Value::as_str)
        .map(String::from);

    success(AuthStatus {
        message: "Already authorized; the stored token is valid".to_string(),
        expiry,
    })
    .map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calbridge_providers::google::Credential;

    fn outcome(json: &str, source: CredentialSource) -> AuthOutcome {
        AuthOutcome {
            credential: Credential::from_token_json(json).unwrap(),
            source,
        }
    }

    #[test]
    fn valid_token_reports_expiry() {
        let outcome = outcome(
            r#"{"token": "ya29", "expiry": "2099-01-15T10:00:00Z"}"#,
            CredentialSource::Existing,
        );
        let doc = report(&outcome).unwrap().unwrap();
        insta::assert_json_snapshot!(doc, @r#"
        {
          "status": "success",
          "message": "Already authorized; the stored token is valid",
          "expiry": "2099-01-15T10:00:00.000000Z"
        }
        "#);
    }

    #[test]
    fn token_without_expiry() {
        let outcome = outcome(r#"{"token": "ya29"}"#, CredentialSource::Existing);
        let doc = report(&outcome).unwrap().unwrap();
        assert!(doc["expiry"].is_null());
    }

    #[test]
    fn new_tokens_print_nothing_more() {
        for source in [CredentialSource::Refreshed, CredentialSource::Authorized] {
            let outcome = outcome(r#"{"token": "ya29"}"#, source);
            assert!(report(&outcome).unwrap().is_none());
        }
    }
}
