//! Google Calendar API client.
//!
//! A thin HTTP layer over Calendar API v3: it builds the requests, attaches
//! the bearer token, and classifies failures into [`ProviderError`]s.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

use super::config::GoogleConfig;
use super::event::{ApiEvent, EventListResponse, EventQuery};

/// Google Calendar API client bound to one calendar and one access token.
#[derive(Debug)]
pub struct CalendarClient {
    http_client: reqwest::Client,
    api_base: String,
    calendar_id: String,
    access_token: String,
}

impl CalendarClient {
    /// Creates a client for the configured calendar.
    pub fn new(config: &GoogleConfig, access_token: impl Into<String>) -> ProviderResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| {
                ProviderError::dependency(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })?;

        Ok(Self {
            http_client,
            api_base: config.endpoints.api_base.trim_end_matches('/').to_string(),
            calendar_id: config.calendar_id.clone(),
            access_token: access_token.into(),
        })
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.api_base,
            urlencoding::encode(&self.calendar_id)
        )
    }

    fn event_url(&self, event_id: &str) -> String {
        format!("{}/{}", self.events_url(), urlencoding::encode(event_id))
    }

    /// Lists upcoming events, expanded and ordered by start time.
    pub async fn list_events(&self, query: &EventQuery) -> ProviderResult<Vec<ApiEvent>> {
        let request = self
            .http_client
            .get(self.events_url())
            .query(&query.query_pairs());

        let list: EventListResponse = self.send_json(request).await?;
        debug!(
            "fetched {} events from calendar {}",
            list.items.len(),
            self.calendar_id
        );
        Ok(list.items)
    }

    /// Fetches an event as an untyped JSON object, so that fields this tool
    /// does not model survive a later update.
    pub async fn get_event_raw(&self, event_id: &str) -> ProviderResult<Map<String, Value>> {
        let request = self.http_client.get(self.event_url(event_id));
        self.send_json(request).await
    }

    /// Fetches an event.
    pub async fn get_event(&self, event_id: &str) -> ProviderResult<ApiEvent> {
        let request = self.http_client.get(self.event_url(event_id));
        self.send_json(request).await
    }

    /// Inserts an event and returns it as stored.
    pub async fn insert_event(&self, body: &Value) -> ProviderResult<ApiEvent> {
        let request = self.http_client.post(self.events_url()).json(body);
        self.send_json(request).await
    }

    /// Replaces an event and returns it as stored.
    pub async fn update_event(
        &self,
        event_id: &str,
        body: &Map<String, Value>,
    ) -> ProviderResult<ApiEvent> {
        let request = self.http_client.put(self.event_url(event_id)).json(body);
        self.send_json(request).await
    }

    /// Deletes an event.
    pub async fn delete_event(&self, event_id: &str) -> ProviderResult<()> {
        let request = self.http_client.delete(self.event_url(event_id));
        self.send(request).await?;
        Ok(())
    }

    /// Lists the calendars visible to the user.
    pub async fn list_calendars(&self) -> ProviderResult<Vec<CalendarListEntry>> {
        let url = format!("{}/users/me/calendarList", self.api_base);
        let list: CalendarListResponse = self.send_json(self.http_client.get(&url)).await?;
        Ok(list.items)
    }

    async fn send(&self, request: RequestBuilder) -> ProviderResult<Response> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::network("request timeout")
                } else if e.is_connect() {
                    ProviderError::network(format!("connection failed: {}", e))
                } else {
                    ProviderError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(ProviderError::from_status(
                status.as_u16(),
                format!(
                    "rate limit exceeded{}",
                    retry_after
                        .map(|s| format!(", retry after {} seconds", s))
                        .unwrap_or_default()
                ),
            ));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ProviderError::from_status(
            status.as_u16(),
            api_error_message(&body, status),
        ))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ProviderResult<T> {
        let response = self.send(request).await?;

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
        })
    }
}

/// Extracts Google's `error.message` from an error body, falling back to the
/// status reason.
fn api_error_message(body: &str, status: StatusCode) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        error: ErrorDetail,
    }

    #[derive(Deserialize)]
    struct ErrorDetail {
        #[serde(default)]
        message: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        })
}

/// Response from the calendarList endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListEntry>,
}

/// A calendar from the calendar list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarListEntry {
    /// The calendar ID.
    pub id: String,
    /// The calendar summary (name).
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Whether this is the primary calendar.
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub time_zone: Option<String>,
}
