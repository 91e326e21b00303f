//! OAuth 2.0 PKCE flows for Google APIs.
//!
//! Two ways of obtaining the authorization code are supported:
//!
//! - **Loopback**: a local HTTP server on an ephemeral port receives Google's
//!   redirect after the system browser was opened on the consent page.
//! - **Headless**: the consent URL is handed to the caller, who completes the
//!   authorization elsewhere and pastes the code (or the whole redirected
//!   URL) on stdin.
//!
//! Both flows use PKCE (RFC 7636) with a random `state`, and both give up
//! once the configured authorization timeout elapses.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::authenticator::{AuthBackend, AuthReporter, BoxFuture, FlowMode};
use super::config::{GoogleConfig, GoogleEndpoints, OAuthCredentials};

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Redirect URI registered for installed apps when no local server is used.
pub const HEADLESS_REDIRECT_URI: &str = "http://localhost";

/// OAuth client for Google APIs.
#[derive(Debug)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    endpoints: GoogleEndpoints,
    scopes: Vec<String>,
    auth_timeout: Duration,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client from the Google configuration.
    ///
    /// Fails only when the HTTP/TLS stack cannot be initialized.
    pub fn new(config: &GoogleConfig) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                ProviderError::dependency(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            credentials: config.credentials.clone(),
            endpoints: config.endpoints.clone(),
            scopes: config.scopes.clone(),
            auth_timeout: config.auth_timeout,
            http_client,
        })
    }

    /// Runs the loopback flow: local server, browser, redirect.
    pub async fn authorize_loopback(&self) -> ProviderResult<TokenGrant> {
        let pkce = PkceFlow::new();

        let (listener, port) = Self::bind_loopback_server()?;
        let redirect_uri = format!("http://127.0.0.1:{}/callback", port);

        let auth_url = pkce.build_auth_url(
            &self.endpoints.auth_url,
            &self.credentials.client_id,
            &redirect_uri,
            &self.scopes,
        );

        info!("starting OAuth flow, opening browser...");
        debug!("authorization URL: {}", auth_url);

        if let Err(e) = open::that(&auth_url) {
            warn!("failed to open browser: {}", e);
            eprintln!("\nPlease open this URL in your browser:\n\n{}\n", auth_url);
        }

        let callback = Self::wait_for_callback(listener, self.auth_timeout)?;
        let code = callback.into_code(&pkce.state)?;

        info!("received authorization code, exchanging for tokens...");
        self.exchange_code(&code, &pkce.verifier, &redirect_uri).await
    }

    /// Runs the headless flow: announce the URL, read the code from stdin.
    pub async fn authorize_headless(&self, reporter: &dyn AuthReporter) -> ProviderResult<TokenGrant> {
        let pkce = PkceFlow::new();

        let auth_url = pkce.build_auth_url(
            &self.endpoints.auth_url,
            &self.credentials.client_id,
            HEADLESS_REDIRECT_URI,
            &self.scopes,
        );

        info!("starting headless OAuth flow");
        reporter.authorize_url(&auth_url);

        let line = Self::read_pasted_line(self.auth_timeout)?;
        let code = parse_pasted_code(&line, &pkce.state)?;

        info!("received authorization code, exchanging for tokens...");
        self.exchange_code(&code, &pkce.verifier, HEADLESS_REDIRECT_URI)
            .await
    }

    /// Refreshes an expired access token using the refresh token.
    pub async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<TokenGrant> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let grant = self.post_token_form(&params, "token refresh").await?;
        info!("successfully refreshed access token");
        Ok(grant)
    }

    /// Exchanges an authorization code for tokens.
    async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> ProviderResult<TokenGrant> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let grant = self.post_token_form(&params, "token exchange").await?;
        info!("successfully obtained tokens");
        Ok(grant)
    }

    async fn post_token_form(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenGrant> {
        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{} failed ({}): {}",
                what,
                status,
                token_error_description(&body)
            )));
        }

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::invalid_response(format!("invalid token response: {}", e)))
    }

    /// Binds a TCP listener on an ephemeral loopback port.
    fn bind_loopback_server() -> ProviderResult<(TcpListener, u16)> {
        let listener = TcpListener::bind("127.0.0.1:0").map_err(|e| {
            ProviderError::internal(format!("failed to bind loopback server: {}", e))
        })?;
        let port = listener
            .local_addr()
            .map_err(|e| ProviderError::internal(format!("failed to read local address: {}", e)))?
            .port();
        debug!("bound loopback server on port {}", port);
        Ok((listener, port))
    }

    /// Waits for the OAuth redirect and extracts its parameters.
    fn wait_for_callback(listener: TcpListener, timeout: Duration) -> ProviderResult<CallbackParams> {
        let (tx, rx) = mpsc::channel();

        // Accept on a helper thread so the wait can be bounded
        let _handle = thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        if let Some(params) = Self::handle_callback(stream) {
                            let _ = tx.send(params);
                            return;
                        }
                    }
                    Err(e) => {
                        error!("failed to accept connection: {}", e);
                    }
                }
            }
        });

        match rx.recv_timeout(timeout) {
            Ok(params) => Ok(params),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ProviderError::authentication(format!(
                "no authorization received within {} seconds",
                timeout.as_secs()
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ProviderError::internal("callback channel disconnected"))
            }
        }
    }

    /// Handles one HTTP request on the callback server.
    ///
    /// Returns `None` for requests that are not the OAuth redirect (favicon
    /// fetches and the like), so the server keeps listening.
    fn handle_callback(mut stream: TcpStream) -> Option<CallbackParams> {
        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();

        if reader.read_line(&mut request_line).is_err() {
            return None;
        }

        // GET /callback?code=...&state=... HTTP/1.1
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() < 2 || parts[0] != "GET" || !parts[1].starts_with("/callback") {
            let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
            return None;
        }

        let params = CallbackParams::from_url(&format!("http://127.0.0.1{}", parts[1]));

        let response = if params.error.is_some() || params.code.is_none() {
            "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Authorization Failed</h1>\
            <p>You can close this window.</p></body></html>"
        } else {
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
            <html><body><h1>Authorization Successful</h1>\
            <p>You can close this window and return to the terminal.</p></body></html>"
        };

        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();

        Some(params)
    }

    /// Reads one line from stdin, bounded by `timeout`.
    fn read_pasted_line(timeout: Duration) -> ProviderResult<String> {
        let (tx, rx) = mpsc::channel();

        let _handle = thread::spawn(move || {
            let mut line = String::new();
            let read = std::io::stdin().lock().read_line(&mut line);
            let _ = tx.send(read.map(|n| (n, line)));
        });

        match rx.recv_timeout(timeout) {
            Ok(Ok((0, _))) => Err(ProviderError::authentication(
                "stdin closed before an authorization code was entered",
            )),
            Ok(Ok((_, line))) => Ok(line),
            Ok(Err(e)) => Err(ProviderError::internal(format!(
                "failed to read authorization code: {}",
                e
            ))
            .with_source(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ProviderError::authentication(format!(
                "no authorization code entered within {} seconds",
                timeout.as_secs()
            ))),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(ProviderError::internal("stdin reader disconnected"))
            }
        }
    }
}

impl AuthBackend for OAuthClient {
    fn refresh<'a>(&'a self, refresh_token: &'a str) -> BoxFuture<'a, ProviderResult<TokenGrant>> {
        Box::pin(self.refresh_token(refresh_token))
    }

    fn authorize<'a>(
        &'a self,
        mode: FlowMode,
        reporter: &'a dyn AuthReporter,
    ) -> BoxFuture<'a, ProviderResult<TokenGrant>> {
        Box::pin(async move {
            match mode {
                FlowMode::Headless => self.authorize_headless(reporter).await,
                FlowMode::Loopback => self.authorize_loopback().await,
            }
        })
    }
}

/// Query parameters carried by Google's redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl CallbackParams {
    /// Extracts the parameters from a redirect URL. Unparseable URLs yield
    /// empty parameters.
    pub fn from_url(raw: &str) -> Self {
        let mut params = Self::default();
        let Ok(url) = url::Url::parse(raw) else {
            return params;
        };
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }

    /// Validates the redirect against the issued state and returns the code.
    ///
    /// A missing `state` is tolerated; a different one is not.
    pub fn into_code(self, expected_state: &str) -> ProviderResult<String> {
        if let Some(error) = self.error {
            return Err(ProviderError::authentication(format!(
                "authorization denied: {}",
                error
            )));
        }

        if let Some(ref state) = self.state
            && state != expected_state
        {
            return Err(ProviderError::authentication(
                "OAuth state mismatch - possible CSRF attack",
            ));
        }

        self.code
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::authentication("missing authorization code in callback"))
    }
}

/// Interprets a pasted line: either a bare authorization code or the full
/// redirected URL. A bare code copied from the address bar is still
/// percent-encoded and is decoded here.
pub fn parse_pasted_code(line: &str, expected_state: &str) -> ProviderResult<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::authentication("empty authorization code"));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") || trimmed.contains("code=")
    {
        let raw = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("{}/?{}", HEADLESS_REDIRECT_URI, trimmed.trim_start_matches(['?', '/']))
        };
        return CallbackParams::from_url(&raw).into_code(expected_state);
    }

    urlencoding::decode(trimmed)
        .map(|code| code.into_owned())
        .map_err(|e| {
            ProviderError::authentication(format!("authorization code is not valid UTF-8: {}", e))
        })
}

/// Pulls `error_description` (or `error`) out of a token endpoint error body.
fn token_error_description(body: &str) -> String {
    #[derive(Deserialize)]
    struct TokenError {
        error: Option<String>,
        error_description: Option<String>,
    }

    match serde_json::from_str::<TokenError>(body) {
        Ok(TokenError {
            error_description: Some(description),
            ..
        }) => description,
        Ok(TokenError {
            error: Some(error), ..
        }) => error,
        _ => body.to_string(),
    }
}

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state for CSRF protection.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub fn new() -> Self {
        let verifier = Self::generate_verifier();
        let challenge = Self::compute_challenge(&verifier);
        let state = Self::generate_state();

        Self {
            verifier,
            challenge,
            state,
        }
    }

    fn generate_verifier() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..CODE_VERIFIER_LENGTH).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    fn generate_state() -> String {
        let mut rng = rand::rng();
        let bytes: Vec<u8> = (0..16).map(|_| rng.random()).collect();
        URL_SAFE_NO_PAD.encode(&bytes)
    }

    /// Builds the Google OAuth authorization URL.
    pub fn build_auth_url(
        &self,
        auth_endpoint: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}&\
            access_type=offline&prompt=consent",
            auth_endpoint,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.challenge),
            urlencoding::encode(&self.state),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenGrant {
    /// The granted scopes, if Google reported them.
    pub fn granted_scopes(&self) -> Option<Vec<String>> {
        self.scope
            .as_deref()
            .map(|s| s.split_whitespace().map(String::from).collect())
    }
}
