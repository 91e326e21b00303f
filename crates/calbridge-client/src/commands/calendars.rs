//! Calendar list command.

use calbridge_providers::google::{CalendarClient, CalendarListEntry};
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientResult;
use crate::output::success;

#[derive(Debug, Serialize)]
pub struct CalendarListing {
    pub count: usize,
    pub calendars: Vec<ListedCalendar>,
}

#[derive(Debug, Serialize)]
pub struct ListedCalendar {
    pub id: String,
    pub summary: String,
    pub description: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

impl From<CalendarListEntry> for ListedCalendar {
    fn from(entry: CalendarListEntry) -> Self {
        Self {
            id: entry.id,
            summary: entry.summary,
            description: entry.description.unwrap_or_default(),
            time_zone: entry.time_zone.unwrap_or_default(),
        }
    }
}

pub fn listing(entries: Vec<CalendarListEntry>) -> CalendarListing {
    CalendarListing {
        count: entries.len(),
        calendars: entries.into_iter().map(ListedCalendar::from).collect(),
    }
}

pub async fn list(client: &CalendarClient) -> ClientResult<Value> {
    let entries = client.list_calendars().await?;
    success(listing(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calendar_listing_document() {
        let entries: Vec<CalendarListEntry> = serde_json::from_str(
            r#"[
                {"id": "me@example.com", "summary": "Personal", "primary": true, "timeZone": "America/Sao_Paulo"},
                {"id": "team@group.calendar.google.com", "summary": "Team", "description": "Shared"}
            ]"#,
        )
        .unwrap();

        let doc = success(listing(entries)).unwrap();
        insta::assert_json_snapshot!(doc, @r#"
        {
          "status": "success",
          "count": 2,
          "calendars": [
            {
              "id": "me@example.com",
              "summary": "Personal",
              "description": "",
              "timeZone": "America/Sao_Paulo"
            },
            {
              "id": "team@group.calendar.google.com",
              "summary": "Team",
              "description": "Shared",
              "timeZone": ""
            }
          ]
        }
        "#);
    }
}
