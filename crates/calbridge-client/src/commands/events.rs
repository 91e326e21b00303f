//! Event commands.

use calbridge_core::truncate_chars;
use calbridge_providers::google::{ApiEvent, CalendarClient, EventPatch, EventQuery, NewEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::ClientResult;
use crate::output::success;

/// Title shown for events without one.
pub const UNTITLED: &str = "(No title)";

/// Listings show at most this many characters of a description.
pub const LIST_DESCRIPTION_CHARS: usize = 200;

#[derive(Debug, Serialize)]
pub struct EventListing {
    pub count: usize,
    pub events: Vec<ListedEvent>,
}

#[derive(Debug, Serialize)]
pub struct ListedEvent {
    pub id: Option<String>,
    pub summary: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: String,
    pub description: String,
}

impl From<ApiEvent> for ListedEvent {
    fn from(event: ApiEvent) -> Self {
        let description = event.description.unwrap_or_default();
        Self {
            start: event.start.display().map(String::from),
            end: event.end.display().map(String::from),
            id: event.id,
            summary: event.summary.unwrap_or_else(|| UNTITLED.to_string()),
            location: event.location.unwrap_or_default(),
            description: truncate_chars(&description, LIST_DESCRIPTION_CHARS).to_string(),
        }
    }
}

/// Result of a create or update.
#[derive(Debug, Serialize)]
pub struct EventWritten {
    pub message: String,
    pub event: WrittenEvent,
}

#[derive(Debug, Serialize)]
pub struct WrittenEvent {
    pub id: Option<String>,
    pub summary: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
}

impl From<ApiEvent> for WrittenEvent {
    fn from(event: ApiEvent) -> Self {
        Self {
            start: event.start.display().map(String::from),
            end: event.end.display().map(String::from),
            id: event.id,
            summary: event.summary,
            html_link: event.html_link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EventDetail {
    pub event: DetailedEvent,
}

#[derive(Debug, Serialize)]
pub struct DetailedEvent {
    pub id: Option<String>,
    pub summary: String,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: String,
    pub description: String,
    #[serde(rename = "htmlLink")]
    pub html_link: Option<String>,
}

impl From<ApiEvent> for DetailedEvent {
    fn from(event: ApiEvent) -> Self {
        Self {
            start: event.start.display().map(String::from),
            end: event.end.display().map(String::from),
            id: event.id,
            summary: event.summary.unwrap_or_else(|| UNTITLED.to_string()),
            location: event.location.unwrap_or_default(),
            description: event.description.unwrap_or_default(),
            html_link: event.html_link,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: String,
}

/// Builds the listing document.
pub fn listing(events: Vec<ApiEvent>) -> EventListing {
    EventListing {
        count: events.len(),
        events: events.into_iter().map(ListedEvent::from).collect(),
    }
}

pub async fn list(client: &CalendarClient, query: &EventQuery) -> ClientResult<Value> {
    debug!(?query, "listing events");
    let events = client.list_events(query).await?;
    success(listing(events))
}

pub async fn create(
    client: &CalendarClient,
    event: &NewEvent,
    time_zone: &str,
) -> ClientResult<Value> {
    let created = client.insert_event(&event.to_body(time_zone)).await?;
    info!("created event {}", created.id.as_deref().unwrap_or_default());
    success(EventWritten {
        message: "Event created".to_string(),
        event: created.into(),
    })
}

/// Fetches the event, overwrites the patched fields, and writes it back.
pub async fn update(
    client: &CalendarClient,
    event_id: &str,
    patch: &EventPatch,
    time_zone: &str,
) -> ClientResult<Value> {
    let mut event = client.get_event_raw(event_id).await?;
    patch.apply(&mut event, time_zone);
    let updated = client.update_event(event_id, &event).await?;
    info!("updated event {}", event_id);
    success(EventWritten {
        message: "Event updated".to_string(),
        event: updated.into(),
    })
}

pub async fn delete(client: &CalendarClient, event_id: &str) -> ClientResult<Value> {
    client.delete_event(event_id).await?;
    info!("deleted event {}", event_id);
    success(Deleted {
        message: format!("Event {} deleted", event_id),
    })
}

pub async fn get(client: &CalendarClient, event_id: &str) -> ClientResult<Value> {
    let event = client.get_event(event_id).await?;
    success(EventDetail {
        event: event.into(),
    })
}
