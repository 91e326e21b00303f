//! Calendar API event payloads and request builders.

use calbridge_core::{InputTime, TimeParseError, to_query_bound};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::warn;

/// Length, in minutes, of an event created without an explicit end.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Default page size of an event listing.
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Start or end of an event as the API represents it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEventTime {
    /// All-day events carry a date (`YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Timed events carry an RFC 3339 datetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl ApiEventTime {
    /// A timed value in the given time zone.
    pub fn at(time: &InputTime, time_zone: &str) -> Self {
        Self {
            date: None,
            date_time: Some(time.to_iso()),
            time_zone: Some(time_zone.to_string()),
        }
    }

    /// The datetime, or the date for all-day events.
    pub fn display(&self) -> Option<&str> {
        self.date_time.as_deref().or(self.date.as_deref())
    }
}

/// The fields of an event this tool reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: ApiEventTime,
    #[serde(default)]
    pub end: ApiEventTime,
    #[serde(default)]
    pub html_link: Option<String>,
}

/// Response from the events.list endpoint.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventListResponse {
    #[serde(default)]
    pub items: Vec<ApiEvent>,
}

/// Parameters of an event listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
    pub max_results: u32,
    pub time_min: DateTime<Utc>,
    pub time_max: Option<DateTime<Utc>>,
}

impl EventQuery {
    /// Builds a query from raw arguments.
    ///
    /// A missing or unparseable lower bound becomes `now`; an unparseable
    /// upper bound is dropped.
    pub fn from_args(
        max_results: u32,
        time_min: Option<&str>,
        time_max: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        let time_min = match time_min.filter(|s| !s.trim().is_empty()) {
            Some(raw) => match InputTime::parse(raw) {
                Ok(t) => t.to_utc(),
                Err(e) => {
                    warn!("{}; listing from now", e);
                    now
                }
            },
            None => now,
        };

        let time_max = time_max
            .filter(|s| !s.trim().is_empty())
            .and_then(|raw| match InputTime::parse(raw) {
                Ok(t) => Some(t.to_utc()),
                Err(e) => {
                    warn!("{}; listing without upper bound", e);
                    None
                }
            });

        Self {
            max_results,
            time_min,
            time_max,
        }
    }

    /// Query string pairs for the events.list request.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("timeMin", to_query_bound(self.time_min)),
            ("maxResults", self.max_results.to_string()),
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
        ];
        if let Some(max) = self.time_max {
            pairs.push(("timeMax", to_query_bound(max)));
        }
        pairs
    }
}

/// A validated event to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub summary: String,
    pub start: InputTime,
    pub end: InputTime,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl NewEvent {
    /// Validates the times. Without `end`, the event lasts
    /// [`DEFAULT_EVENT_MINUTES`].
    pub fn new(
        summary: impl Into<String>,
        start: &str,
        end: Option<&str>,
        location: Option<String>,
        description: Option<String>,
    ) -> Result<Self, TimeParseError> {
        let start_time = InputTime::parse(start)?;
        let end_time = match end.filter(|s| !s.trim().is_empty()) {
            Some(raw) => InputTime::parse(raw)?,
            None => start_time
                .checked_add(Duration::minutes(DEFAULT_EVENT_MINUTES))
                .ok_or_else(|| TimeParseError {
                    input: start.to_string(),
                })?,
        };

        Ok(Self {
            summary: summary.into(),
            start: start_time,
            end: end_time,
            location: location.filter(|s| !s.is_empty()),
            description: description.filter(|s| !s.is_empty()),
        })
    }

    /// The events.insert request body.
    pub fn to_body(&self, time_zone: &str) -> Value {
        let mut body = json!({
            "summary": self.summary,
            "start": ApiEventTime::at(&self.start, time_zone),
            "end": ApiEventTime::at(&self.end, time_zone),
        });
        if let Some(location) = &self.location {
            body["location"] = json!(location);
        }
        if let Some(description) = &self.description {
            body["description"] = json!(description);
        }
        body
    }
}

/// Fields to overwrite on an existing event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub start: Option<InputTime>,
    pub end: Option<InputTime>,
    /// `Some("")` clears the location.
    pub location: Option<String>,
    /// `Some("")` clears the description.
    pub description: Option<String>,
}

impl EventPatch {
    /// Builds a patch from raw arguments. Empty summary and times are
    /// ignored; location and description are applied as given.
    pub fn new(
        summary: Option<String>,
        start: Option<&str>,
        end: Option<&str>,
        location: Option<String>,
        description: Option<String>,
    ) -> Result<Self, TimeParseError> {
        let parse = |raw: Option<&str>| {
            raw.filter(|s| !s.trim().is_empty())
                .map(InputTime::parse)
                .transpose()
        };

        Ok(Self {
            summary: summary.filter(|s| !s.is_empty()),
            start: parse(start)?,
            end: parse(end)?,
            location,
            description,
        })
    }

    /// Overwrites the patched fields of a fetched event.
    pub fn apply(&self, event: &mut Map<String, Value>, time_zone: &str) {
        if let Some(summary) = &self.summary {
            event.insert("summary".into(), json!(summary));
        }
        if let Some(start) = &self.start {
            event.insert("start".into(), json!(ApiEventTime::at(start, time_zone)));
        }
        if let Some(end) = &self.end {
            event.insert("end".into(), json!(ApiEventTime::at(end, time_zone)));
        }
        if let Some(location) = &self.location {
            event.insert("location".into(), json!(location));
        }
        if let Some(description) = &self.description {
            event.insert("description".into(), json!(description));
        }
    }
}
