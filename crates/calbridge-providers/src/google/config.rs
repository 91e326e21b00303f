//! Google Calendar configuration.

use std::time::Duration;

/// OAuth 2.0 credentials for Google API access.
///
/// Users must provide their own OAuth client ID and secret, as Google
/// requires registered applications for API access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

impl OAuthCredentials {
    /// Creates new OAuth credentials.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Validates that both halves are present.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.trim().is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// Google endpoints used by the OAuth flow and the Calendar client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    /// Authorization (consent page) endpoint.
    pub auth_url: String,
    /// Token endpoint for code exchange and refresh.
    pub token_url: String,
    /// Base URL of the Calendar API v3.
    pub api_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://www.googleapis.com/calendar/v3".to_string(),
        }
    }
}

/// Configuration for talking to Google Calendar.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth credentials for API access.
    pub credentials: OAuthCredentials,

    /// OAuth and API endpoints.
    pub endpoints: GoogleEndpoints,

    /// Calendar that event operations target.
    ///
    /// Defaults to `"primary"`.
    pub calendar_id: String,

    /// IANA time zone attached to the start/end of written events.
    pub time_zone: String,

    /// OAuth scopes to request.
    ///
    /// Defaults to `["https://www.googleapis.com/auth/calendar"]`.
    pub scopes: Vec<String>,

    /// Request timeout.
    pub timeout: Duration,

    /// How long an authorization flow may wait for the user.
    pub auth_timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default authorization wait in seconds.
    pub const DEFAULT_AUTH_TIMEOUT_SECS: u64 = 300;

    /// Default OAuth scope for read/write calendar access.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";

    /// Default calendar.
    pub const DEFAULT_CALENDAR_ID: &'static str = "primary";

    /// Default time zone for written events.
    pub const DEFAULT_TIME_ZONE: &'static str = "America/Sao_Paulo";

    /// Creates a new Google configuration with the given credentials.
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            endpoints: GoogleEndpoints::default(),
            calendar_id: Self::DEFAULT_CALENDAR_ID.to_string(),
            time_zone: Self::DEFAULT_TIME_ZONE.to_string(),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            auth_timeout: Duration::from_secs(Self::DEFAULT_AUTH_TIMEOUT_SECS),
            user_agent: format!("calbridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the endpoints.
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the calendar ID.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the time zone for written events.
    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the authorization wait.
    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials
            .validate()
            .map_err(|e| format!("invalid credentials: {}", e))?;

        if self.scopes.is_empty() {
            return Err("at least one OAuth scope is required".to_string());
        }

        if self.calendar_id.trim().is_empty() {
            return Err("calendar id must not be empty".to_string());
        }

        if self.auth_timeout.is_zero() {
            return Err("authorization timeout must be positive".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> OAuthCredentials {
        OAuthCredentials::new("test-client.apps.googleusercontent.com", "test-secret")
    }

    #[test]
    fn credentials_validation() {
        assert!(test_credentials().validate().is_ok());
        assert!(OAuthCredentials::new("", "secret").validate().is_err());
        assert!(OAuthCredentials::new("id", "  ").validate().is_err());
    }

    #[test]
    fn config_defaults() {
        let config = GoogleConfig::new(test_credentials());
        assert_eq!(config.calendar_id, "primary");
        assert_eq!(config.time_zone, "America/Sao_Paulo");
        assert_eq!(config.scopes, vec![GoogleConfig::DEFAULT_SCOPE.to_string()]);
        assert_eq!(config.auth_timeout, Duration::from_secs(300));
        assert_eq!(
            config.endpoints.token_url,
            "https://oauth2.googleapis.com/token"
        );
    }

    #[test]
    fn config_builder_methods() {
        let config = GoogleConfig::new(test_credentials())
            .with_calendar_id("team@group.calendar.google.com")
            .with_time_zone("Europe/Lisbon")
            .with_timeout(Duration::from_secs(5))
            .with_auth_timeout(Duration::from_secs(60));

        assert_eq!(config.calendar_id, "team@group.calendar.google.com");
        assert_eq!(config.time_zone, "Europe/Lisbon");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.auth_timeout, Duration::from_secs(60));
    }

    #[test]
    fn config_validation() {
        assert!(GoogleConfig::new(test_credentials()).validate().is_ok());
        let mut no_scopes = GoogleConfig::new(test_credentials());
        no_scopes.scopes.clear();
        assert!(no_scopes.validate().is_err());
        assert!(
            GoogleConfig::new(test_credentials())
                .with_auth_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
