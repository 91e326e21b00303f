//! Credential lifecycle: reuse, refresh, or authorize.
//!
//! [`Authenticator::obtain`] drives a credential from whatever state it is in
//! to a usable one:
//!
//! | state          | action                                              |
//! |----------------|-----------------------------------------------------|
//! | `Valid`        | used as-is                                          |
//! | `Expired`      | refreshed when a refresh token exists, else authorize |
//! | `NoCredential` | authorization flow                                  |
//!
//! A failed refresh is reported and falls through to a full authorization.
//! The network side sits behind [`AuthBackend`], and the user-facing
//! announcements behind [`AuthReporter`].

use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::config::{GoogleConfig, OAuthCredentials};
use super::oauth::TokenGrant;
use super::tokens::{AuthState, Credential};

/// A boxed future that is Send.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// How the authorization code is collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowMode {
    /// Print the consent URL and read the code from stdin.
    Headless,
    /// Open a browser and receive the redirect on a loopback server.
    Loopback,
}

/// The token endpoint operations the lifecycle needs.
pub trait AuthBackend: Send + Sync {
    /// Exchanges a refresh token for a fresh access token.
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<TokenGrant>>;

    /// Runs an interactive authorization flow.
    fn authorize<'a>(
        &'a self,
        mode: FlowMode,
        reporter: &'a dyn AuthReporter,
    ) -> BoxFuture<'a, ProviderResult<TokenGrant>>;
}

/// Receives the progress announcements of the lifecycle.
pub trait AuthReporter: Send + Sync {
    /// A consent URL the user must visit.
    fn authorize_url(&self, url: &str);

    /// The access token was renewed.
    fn token_refreshed(&self, credential: &Credential);

    /// Renewal failed; a full authorization follows.
    fn refresh_failed(&self, error: &ProviderError);

    /// An authorization flow produced a new credential.
    fn authorization_complete(&self, credential: &Credential);
}

/// How the returned credential was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Existing,
    Refreshed,
    Authorized,
}

/// A usable credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub credential: Credential,
    pub source: CredentialSource,
}

/// Drives credentials through their lifecycle.
pub struct Authenticator<'r, B> {
    backend: B,
    reporter: &'r dyn AuthReporter,
    client: OAuthCredentials,
    token_uri: String,
    scopes: Vec<String>,
    mode: FlowMode,
}

impl<'r, B: AuthBackend> Authenticator<'r, B> {
    pub fn new(
        backend: B,
        reporter: &'r dyn AuthReporter,
        config: &GoogleConfig,
        mode: FlowMode,
    ) -> Self {
        Self {
            backend,
            reporter,
            client: config.credentials.clone(),
            token_uri: config.endpoints.token_url.clone(),
            scopes: config.scopes.clone(),
            mode,
        }
    }

    /// Returns a usable credential, refreshing or authorizing as needed.
    ///
    /// Only an authorization failure is an error; a refresh failure is
    /// reported and recovered from.
    pub async fn obtain(&self, existing: Option<Credential>) -> ProviderResult<AuthOutcome> {
        let state = AuthState::of(existing.as_ref(), Utc::now());
        debug!(?state, mode = ?self.mode, "resolving credential");

        let existing = match (state, existing) {
            (AuthState::Valid, Some(credential)) => {
                return Ok(AuthOutcome {
                    credential,
                    source: CredentialSource::Existing,
                });
            }
            (AuthState::Expired, Some(credential)) if credential.can_refresh() => {
                match self.refresh(credential.clone()).await {
                    Ok(outcome) => return Ok(outcome),
                    Err(e) => {
                        debug!("token refresh failed: {}", e);
                        self.reporter.refresh_failed(&e);
                        Some(credential)
                    }
                }
            }
            (_, existing) => existing,
        };

        self.authorize(existing).await
    }

    async fn refresh(&self, mut credential: Credential) -> ProviderResult<AuthOutcome> {
        let refresh_token = credential.refresh_token.clone().unwrap_or_default();
        let grant = self.backend.refresh(&refresh_token).await?;

        credential.apply_refresh(grant, Utc::now());
        let credential = credential.stamped(&self.client, &self.token_uri);
        info!("access token refreshed");
        self.reporter.token_refreshed(&credential);

        Ok(AuthOutcome {
            credential,
            source: CredentialSource::Refreshed,
        })
    }

    async fn authorize(&self, previous: Option<Credential>) -> ProviderResult<AuthOutcome> {
        let grant = self.backend.authorize(self.mode, self.reporter).await?;

        let mut credential = Credential::from_grant(grant, &self.scopes, Utc::now())
            .stamped(&self.client, &self.token_uri);
        if credential.refresh_token.is_none() {
            credential.refresh_token = previous.and_then(|p| p.refresh_token);
        }
        info!("authorization complete");
        self.reporter.authorization_complete(&credential);

        Ok(AuthOutcome {
            credential,
            source: CredentialSource::Authorized,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockBackend {
        refresh_fails: bool,
        calls: Mutex<Vec<String>>,
    }

    fn grant(access: &str, refresh: Option<&str>) -> TokenGrant {
        TokenGrant {
            access_token: access.to_string(),
            refresh_token: refresh.map(String::from),
            expires_in: Some(3600),
            scope: None,
            token_type: Some("Bearer".to_string()),
        }
    }

    impl AuthBackend for &MockBackend {
        fn refresh<'a>(
            &'a self,
            refresh_token: &'a str,
        ) -> BoxFuture<'a, ProviderResult<TokenGrant>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push(format!("refresh:{}", refresh_token));
                if self.refresh_fails {
                    Err(ProviderError::authentication("invalid_grant"))
                } else {
                    Ok(grant("refreshed", None))
                }
            })
        }

        fn authorize<'a>(
            &'a self,
            mode: FlowMode,
            reporter: &'a dyn AuthReporter,
        ) -> BoxFuture<'a, ProviderResult<TokenGrant>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(format!("authorize:{:?}", mode));
                reporter.authorize_url("https://accounts.example/auth");
                Ok(grant("authorized", Some("new-refresh")))
            })
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Mutex<Vec<String>>,
    }

    impl RecordingReporter {
        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl AuthReporter for RecordingReporter {
        fn authorize_url(&self, _url: &str) {
            self.events.lock().unwrap().push("authorize_url".into());
        }
        fn token_refreshed(&self, _credential: &Credential) {
            self.events.lock().unwrap().push("token_refreshed".into());
        }
        fn refresh_failed(&self, _error: &ProviderError) {
            self.events.lock().unwrap().push("refresh_failed".into());
        }
        fn authorization_complete(&self, _credential: &Credential) {
            self.events.lock().unwrap().push("complete".into());
        }
    }

    fn config() -> GoogleConfig {
        GoogleConfig::new(OAuthCredentials::new("id", "secret"))
    }

    fn expired(refresh: Option<&str>) -> Credential {
        let json = match refresh {
            Some(r) => format!(
                r#"{{"token": "old", "refresh_token": "{}", "expiry": "2020-01-01T00:00:00Z"}}"#,
                r
            ),
            None => r#"{"token": "old", "expiry": "2020-01-01T00:00:00Z"}"#.to_string(),
        };
        Credential::from_token_json(&json).unwrap()
    }

    #[tokio::test]
    async fn valid_credential_is_used_as_is() {
        let backend = MockBackend::default();
        let reporter = RecordingReporter::default();
        let auth = Authenticator::new(&backend, &reporter, &config(), FlowMode::Headless);

        let valid = Credential::from_token_json(r#"{"token": "live"}"#).unwrap();
        let outcome = auth.obtain(Some(valid.clone())).await.unwrap();

        assert_eq!(outcome.source, CredentialSource::Existing);
        assert_eq!(outcome.credential, valid);
        assert!(backend.calls.lock().unwrap().is_empty());
        assert!(reporter.events().is_empty());
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed() {
        let backend = MockBackend::default();
        let reporter = RecordingReporter::default();
        let auth = Authenticator::new(&backend, &reporter, &config(), FlowMode::Headless);

        let outcome = auth.obtain(Some(expired(Some("r1")))).await.unwrap();

        assert_eq!(outcome.source, CredentialSource::Refreshed);
        assert_eq!(outcome.credential.access_token.as_deref(), Some("refreshed"));
        assert_eq!(outcome.credential.refresh_token.as_deref(), Some("r1"));
        assert_eq!(outcome.credential.client_id.as_deref(), Some("id"));
        assert_eq!(*backend.calls.lock().unwrap(), vec!["refresh:r1".to_string()]);
        assert_eq!(reporter.events(), vec!["token_refreshed".to_string()]);
    }

    #[tokio::test]
    async fn failed_refresh_falls_back_to_authorization() {
        let backend = MockBackend {
            refresh_fails: true,
            ..Default::default()
        };
        let reporter = RecordingReporter::default();
        let auth = Authenticator::new(&backend, &reporter, &config(), FlowMode::Loopback);

        let outcome = auth.obtain(Some(expired(Some("r1")))).await.unwrap();

        assert_eq!(outcome.source, CredentialSource::Authorized);
        assert_eq!(outcome.credential.refresh_token.as_deref(), Some("new-refresh"));
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec!["refresh:r1".to_string(), "authorize:Loopback".to_string()]
        );
        assert_eq!(
            reporter.events(),
            vec![
                "refresh_failed".to_string(),
                "authorize_url".to_string(),
                "complete".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn expired_without_refresh_token_authorizes() {
        let backend = MockBackend::default();
        let reporter = RecordingReporter::default();
        let auth = Authenticator::new(&backend, &reporter, &config(), FlowMode::Headless);

        let outcome = auth.obtain(Some(expired(None))).await.unwrap();

        assert_eq!(outcome.source, CredentialSource::Authorized);
        assert_eq!(
            *backend.calls.lock().unwrap(),
            vec!["authorize:Headless".to_string()]
        );
    }

    #[tokio::test]
    async fn missing_credential_authorizes() {
        let backend = MockBackend::default();
        let reporter = RecordingReporter::default();
        let auth = Authenticator::new(&backend, &reporter, &config(), FlowMode::Headless);

        let outcome = auth.obtain(None).await.unwrap();

        assert_eq!(outcome.source, CredentialSource::Authorized);
        assert_eq!(outcome.credential.access_token.as_deref(), Some("authorized"));
        assert_eq!(
            outcome.credential.scopes,
            vec![GoogleConfig::DEFAULT_SCOPE.to_string()]
        );
        assert!(outcome.credential.expiry.is_some());
        assert_eq!(
            reporter.events(),
            vec!["authorize_url".to_string(), "complete".to_string()]
        );
    }
}
