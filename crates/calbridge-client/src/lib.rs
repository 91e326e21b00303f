//! calbridge command-line interface
//!
//! This crate provides the `calbridge` binary: it reads its configuration
//! from the environment, obtains a Google credential, runs one calendar
//! operation, and prints the result as JSON.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

use calbridge_core::ErrorKind;
use calbridge_providers::ProviderError;
use calbridge_providers::google::{Authenticator, CalendarClient, OAuthClient};
use chrono::Utc;
use serde_json::Value;
use tracing::debug;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};

use commands::Request;
use config::EnvConfig;
use output::JsonReporter;

/// Runs one invocation.
///
/// Returns the result document, or `None` when everything the caller needs
/// was already printed as step documents.
pub async fn run(cli: &Cli) -> ClientResult<Option<Value>> {
    let env = EnvConfig::from_env()?;
    if let Some(warning) = &env.token_warning {
        output::print_warning(ErrorKind::InvalidToken, warning.as_str());
    }

    let request = Request::from_cli(cli, Utc::now())?;
    debug!(?request, "request validated");

    let google = env.google_config();
    google.validate().map_err(ClientError::Unexpected)?;

    let reporter = JsonReporter;
    let oauth = OAuthClient::new(&google)?;
    let outcome = Authenticator::new(oauth, &reporter, &google, env.flow_mode())
        .obtain(env.token.clone())
        .await
        .map_err(ClientError::Authorization)?;
    debug!(source = ?outcome.source, "credential ready");

    match request {
        Request::Auth => commands::auth::report(&outcome),
        Request::Calendar(operation) => {
            let token = outcome.credential.access_token.clone().ok_or_else(|| {
                ClientError::Authorization(ProviderError::authentication(
                    "credential carries no access token",
                ))
            })?;
            let client = CalendarClient::new(&google, token)?;
            commands::execute(operation, &client, &google.time_zone)
                .await
                .map(Some)
        }
    }
}
