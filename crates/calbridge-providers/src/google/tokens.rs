//! OAuth credential model.
//!
//! Credentials travel in Google's *authorized user* JSON format (the format
//! written by Google's own client libraries), so a token produced elsewhere
//! can be fed in through the environment and a token printed by this tool
//! can be consumed by those libraries:
//!
//! ```json
//! {
//!   "token": "ya29...",
//!   "refresh_token": "1//0g...",
//!   "token_uri": "https://oauth2.googleapis.com/token",
//!   "client_id": "...apps.googleusercontent.com",
//!   "client_secret": "...",
//!   "scopes": ["https://www.googleapis.com/auth/calendar"],
//!   "expiry": "2024-01-15T10:00:00.123456Z"
//! }
//! ```

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ProviderError, ProviderResult};

use super::config::OAuthCredentials;
use super::oauth::TokenGrant;

/// Access tokens are considered expired this long before their expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Where a credential stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No usable credential: an authorization flow is required.
    NoCredential,
    /// A credential exists but its access token can no longer be used.
    Expired,
    /// The access token can be used as-is.
    Valid,
}

impl AuthState {
    /// Classifies an optional credential at the given instant.
    pub fn of(credential: Option<&Credential>, now: DateTime<Utc>) -> Self {
        match credential {
            None => Self::NoCredential,
            Some(c) if c.is_expired_at(now) => Self::Expired,
            Some(_) => Self::Valid,
        }
    }
}

/// An OAuth user credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The access token for API requests.
    #[serde(rename = "token", default)]
    pub access_token: Option<String>,

    /// The refresh token for obtaining new access tokens.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Token endpoint the refresh token belongs to.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// OAuth client the credential was issued to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// The OAuth scopes that were granted.
    #[serde(default, deserialize_with = "deserialize_scopes")]
    pub scopes: Vec<String>,

    /// When the access token expires (UTC).
    #[serde(
        default,
        serialize_with = "serialize_expiry",
        deserialize_with = "deserialize_expiry"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl Credential {
    /// Parses a credential from the token JSON blob.
    ///
    /// A blob with neither an access token nor a refresh token is rejected.
    pub fn from_token_json(json: &str) -> ProviderResult<Self> {
        let credential: Credential = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration(format!("token JSON could not be parsed: {}", e))
                .with_source(e)
        })?;

        if credential.access_token.is_none() && credential.refresh_token.is_none() {
            return Err(ProviderError::configuration(
                "token JSON contains neither 'token' nor 'refresh_token'",
            ));
        }

        Ok(credential)
    }

    /// Builds a credential from a token endpoint response.
    pub fn from_grant(grant: TokenGrant, requested_scopes: &[String], now: DateTime<Utc>) -> Self {
        let scopes = grant
            .granted_scopes()
            .unwrap_or_else(|| requested_scopes.to_vec());

        Self {
            access_token: Some(grant.access_token),
            refresh_token: grant.refresh_token,
            token_uri: default_token_uri(),
            client_id: None,
            client_secret: None,
            scopes,
            expiry: grant.expires_in.and_then(|secs| expiry_after(now, secs)),
        }
    }

    /// Applies a refresh response. The refresh token is kept unless Google
    /// rotated it.
    pub fn apply_refresh(&mut self, grant: TokenGrant, now: DateTime<Utc>) {
        if let Some(scopes) = grant.granted_scopes() {
            self.scopes = scopes;
        }
        self.access_token = Some(grant.access_token);
        if grant.refresh_token.is_some() {
            self.refresh_token = grant.refresh_token;
        }
        self.expiry = grant.expires_in.and_then(|secs| expiry_after(now, secs));
    }

    /// Records the OAuth client and token endpoint, so the printed token is
    /// self-contained.
    pub fn stamped(mut self, client: &OAuthCredentials, token_uri: &str) -> Self {
        self.client_id = Some(client.client_id.clone());
        self.client_secret = Some(client.client_secret.clone());
        self.token_uri = token_uri.to_string();
        self
    }

    /// Returns true if the access token is missing, expired, or about to expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        if self.access_token.is_none() {
            return true;
        }
        match self.expiry {
            Some(expiry) => now >= expiry - Duration::seconds(EXPIRY_SKEW_SECS),
            // If no expiry is set, assume it's valid
            None => false,
        }
    }

    /// Returns true if the credential can be renewed without user interaction.
    pub fn can_refresh(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|t| !t.trim().is_empty())
    }

    /// The credential as a JSON value, ready to be printed for capture.
    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// `now + expires_in`, or `None` when the lifetime is out of range.
fn expiry_after(now: DateTime<Utc>, expires_in: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(expires_in).and_then(|lifetime| now.checked_add_signed(lifetime))
}

fn deserialize_scopes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scopes {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Scopes>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Scopes::List(list)) => list,
        Some(Scopes::Joined(joined)) => joined.split_whitespace().map(String::from).collect(),
    })
}

fn serialize_expiry<S>(expiry: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match expiry {
        Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    parse_expiry(&raw)
        .map(Some)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid expiry '{}'", raw)))
}

/// Parses `2024-01-15T10:00:00.123456Z`, its naive variant, or RFC 3339.
fn parse_expiry(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive = trimmed.strip_suffix('Z').unwrap_or(trimmed);
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.and_utc())
}
