//! Google Calendar integration.
//!
//! # Authentication Flow
//!
//! 1. The caller provides an OAuth client ID/secret (required by Google) and,
//!    optionally, a previously issued token
//! 2. A valid token is used as-is; an expired one is refreshed
//! 3. Otherwise an authorization runs, either through a local loopback
//!    server and the system browser, or headless by pasting the code
//! 4. New or refreshed tokens are handed back to the caller, who keeps them
//!
//! # Example
//!
//! ```ignore
//! use calbridge_providers::google::{
//!     Authenticator, CalendarClient, FlowMode, GoogleConfig, OAuthClient, OAuthCredentials,
//! };
//!
//! let config = GoogleConfig::new(OAuthCredentials::new(
//!     "your-client-id.apps.googleusercontent.com",
//!     "your-client-secret",
//! ));
//!
//! let oauth = OAuthClient::new(&config)?;
//! let outcome = Authenticator::new(oauth, &reporter, &config, FlowMode::Loopback)
//!     .obtain(None)
//!     .await?;
//!
//! let token = outcome.credential.access_token.unwrap_or_default();
//! let calendars = CalendarClient::new(&config, token)?.list_calendars().await?;
//! ```

mod authenticator;
mod client;
mod config;
mod event;
mod oauth;
mod tokens;

pub use authenticator::{
    AuthBackend, AuthOutcome, AuthReporter, Authenticator, BoxFuture, CredentialSource, FlowMode,
};
pub use client::{CalendarClient, CalendarListEntry};
pub use config::{GoogleConfig, GoogleEndpoints, OAuthCredentials};
pub use event::{
    ApiEvent, ApiEventTime, DEFAULT_EVENT_MINUTES, DEFAULT_MAX_RESULTS, EventPatch, EventQuery,
    NewEvent,
};
pub use oauth::{CallbackParams, HEADLESS_REDIRECT_URI, OAuthClient, PkceFlow, TokenGrant};
pub use tokens::{AuthState, Credential};
