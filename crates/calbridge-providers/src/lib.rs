//! Google OAuth credential lifecycle and Calendar API client.
//!
//! - [`google::Authenticator`] - Turns an optional stored token into a usable one
//! - [`google::CalendarClient`] - Event and calendar-list operations
//! - [`ProviderError`] - Error types for provider operations

pub mod error;
pub mod google;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
