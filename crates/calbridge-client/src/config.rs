//! Environment configuration.
//!
//! Everything calbridge needs comes from environment variables; nothing is
//! read from or written to disk. Variables are read through a lookup
//! function so tests can supply their own.

use std::io::IsTerminal;
use std::time::Duration;

use calbridge_providers::google::{Credential, FlowMode, GoogleConfig, OAuthCredentials};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

pub const CLIENT_ID_VAR: &str = "GOOGLE_CALENDAR_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "GOOGLE_CALENDAR_CLIENT_SECRET";
pub const TOKEN_JSON_VAR: &str = "GOOGLE_CALENDAR_TOKEN_JSON";
pub const CALENDAR_ID_VAR: &str = "GOOGLE_CALENDAR_ID";
pub const TIME_ZONE_VAR: &str = "GOOGLE_CALENDAR_TIMEZONE";
pub const AUTH_TIMEOUT_VAR: &str = "GOOGLE_CALENDAR_AUTH_TIMEOUT_SECS";
pub const HTTP_TIMEOUT_VAR: &str = "GOOGLE_CALENDAR_HTTP_TIMEOUT_SECS";

/// Set by the hosting platform; forces the headless flow.
pub const HOSTING_MARKER_VAR: &str = "RAILWAY_ENVIRONMENT";

/// Configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub credentials: OAuthCredentials,
    /// Previously issued token, if one was supplied and could be parsed.
    pub token: Option<Credential>,
    /// Why a supplied token was discarded.
    pub token_warning: Option<String>,
    pub calendar_id: String,
    pub time_zone: String,
    pub auth_timeout: Duration,
    pub http_timeout: Duration,
    /// Whether the authorization code must be pasted instead of received
    /// through a local server.
    pub headless: bool,
}

impl EnvConfig {
    /// Reads the process environment.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), std::io::stdin().is_terminal())
    }

    /// Resolves the configuration from `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, stdin_is_terminal: bool) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let (Some(client_id), Some(client_secret)) = (get(CLIENT_ID_VAR), get(CLIENT_SECRET_VAR))
        else {
            return Err(ClientError::MissingCredentials(format!(
                "environment variables {} and {} are required",
                CLIENT_ID_VAR, CLIENT_SECRET_VAR
            )));
        };

        let (token, token_warning) = match get(TOKEN_JSON_VAR) {
            None => (None, None),
            Some(raw) => match Credential::from_token_json(&raw) {
                Ok(credential) => (Some(credential), None),
                Err(e) => (
                    None,
                    Some(format!("invalid token in {}: {}", TOKEN_JSON_VAR, e.message())),
                ),
            },
        };

        let headless = !stdin_is_terminal || lookup(HOSTING_MARKER_VAR).is_some();
        debug!(headless, has_token = token.is_some(), "environment loaded");

        Ok(Self {
            credentials: OAuthCredentials::new(client_id, client_secret),
            token,
            token_warning,
            calendar_id: get(CALENDAR_ID_VAR)
                .unwrap_or_else(|| GoogleConfig::DEFAULT_CALENDAR_ID.to_string()),
            time_zone: get(TIME_ZONE_VAR)
                .unwrap_or_else(|| GoogleConfig::DEFAULT_TIME_ZONE.to_string()),
            auth_timeout: seconds(
                AUTH_TIMEOUT_VAR,
                get(AUTH_TIMEOUT_VAR),
                GoogleConfig::DEFAULT_AUTH_TIMEOUT_SECS,
            ),
            http_timeout: seconds(
                HTTP_TIMEOUT_VAR,
                get(HTTP_TIMEOUT_VAR),
                GoogleConfig::DEFAULT_TIMEOUT_SECS,
            ),
            headless,
        })
    }

    /// The Google configuration for this environment.
    pub fn google_config(&self) -> GoogleConfig {
        GoogleConfig::new(self.credentials.clone())
            .with_calendar_id(self.calendar_id.clone())
            .with_time_zone(self.time_zone.clone())
            .with_auth_timeout(self.auth_timeout)
            .with_timeout(self.http_timeout)
    }

    /// The authorization flow to use when one is needed.
    pub fn flow_mode(&self) -> FlowMode {
        if self.headless {
            FlowMode::Headless
        } else {
            FlowMode::Loopback
        }
    }
}

/// Parses a positive number of seconds, falling back to `default`.
fn seconds(var: &str, raw: Option<String>, default: u64) -> Duration {
    let secs = match raw.as_deref().map(|v| v.trim().parse::<u64>()) {
        None => default,
        Some(Ok(secs)) if secs > 0 => secs,
        Some(_) => {
            warn!(
                "{}={:?} is not a positive number of seconds, using {}",
                var,
                raw.as_deref().unwrap_or_default(),
                default
            );
            default
        }
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const CREDS: [(&str, &str); 2] = [(CLIENT_ID_VAR, "id"), (CLIENT_SECRET_VAR, "secret")];

    #[test]
    fn missing_credentials() {
        let err = EnvConfig::from_lookup(env(&[]), true).unwrap_err();
        assert_eq!(err.kind(), calbridge_core::ErrorKind::MissingCredentials);

        let err = EnvConfig::from_lookup(env(&[(CLIENT_ID_VAR, "id")]), true).unwrap_err();
        assert!(matches!(err, ClientError::MissingCredentials(_)));

        let err = EnvConfig::from_lookup(
            env(&[(CLIENT_ID_VAR, "id"), (CLIENT_SECRET_VAR, "")]),
            true,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::MissingCredentials(_)));
    }

    #[test]
    fn defaults() {
        let config = EnvConfig::from_lookup(env(&CREDS), true).unwrap();
        assert_eq!(config.credentials.client_id, "id");
        assert!(config.token.is_none());
        assert!(config.token_warning.is_none());
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.time_zone, "America/Sao_Paulo");
        assert_eq!(config.auth_timeout, Duration::from_secs(300));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(!config.headless);
        assert_eq!(config.flow_mode(), FlowMode::Loopback);
    }

    #[test]
    fn overrides() {
        let mut pairs = CREDS.to_vec();
        pairs.extend([
            (CALENDAR_ID_VAR, "team@group.calendar.google.com"),
            (TIME_ZONE_VAR, "Europe/Lisbon"),
            (AUTH_TIMEOUT_VAR, "45"),
            (HTTP_TIMEOUT_VAR, "often"),
        ]);
        let config = EnvConfig::from_lookup(env(&pairs), true).unwrap();
        assert_eq!(config.auth_timeout, Duration::from_secs(45));
        assert_eq!(config.http_timeout, Duration::from_secs(30));

        let google = config.google_config();
        assert_eq!(google.calendar_id, "team@group.calendar.google.com");
        assert_eq!(google.time_zone, "Europe/Lisbon");
        assert_eq!(google.auth_timeout, Duration::from_secs(45));
        assert!(google.validate().is_ok());
    }

    #[test]
    fn headless_detection() {
        let config = EnvConfig::from_lookup(env(&CREDS), false).unwrap();
        assert!(config.headless);
        assert_eq!(config.flow_mode(), FlowMode::Headless);

        let mut pairs = CREDS.to_vec();
        pairs.push((HOSTING_MARKER_VAR, "production"));
        let config = EnvConfig::from_lookup(env(&pairs), true).unwrap();
        assert!(config.headless);
    }

    #[test]
    fn valid_token_is_loaded() {
        let mut pairs = CREDS.to_vec();
        pairs.push((TOKEN_JSON_VAR, r#"{"token": "ya29", "refresh_token": "r"}"#));
        let config = EnvConfig::from_lookup(env(&pairs), true).unwrap();
        let token = config.token.unwrap();
        assert_eq!(token.access_token.as_deref(), Some("ya29"));
        assert!(config.token_warning.is_none());
    }

    #[test]
    fn malformed_token_is_discarded_with_warning() {
        let mut pairs = CREDS.to_vec();
        pairs.push((TOKEN_JSON_VAR, "{not json"));
        let config = EnvConfig::from_lookup(env(&pairs), true).unwrap();
        assert!(config.token.is_none());
        assert!(config.token_warning.unwrap().contains(TOKEN_JSON_VAR));

        let mut pairs = CREDS.to_vec();
        pairs.push((TOKEN_JSON_VAR, r#"{"scopes": []}"#));
        let config = EnvConfig::from_lookup(env(&pairs), true).unwrap();
        assert!(config.token.is_none());
        assert!(config.token_warning.is_some());
    }
}
