//! Command handlers.
//!
//! A [`Request`] is built and validated from the command line before any
//! authorization happens; the handlers then turn API responses into the
//! result documents.

pub mod auth;
pub mod calendars;
pub mod events;

use calbridge_providers::google::{CalendarClient, EventPatch, EventQuery, NewEvent};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::cli::{Action, Cli};
use crate::error::{ClientError, ClientResult};

/// A validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Only obtain a usable credential.
    Auth,
    /// Run a calendar operation.
    Calendar(Operation),
}

/// Calendar operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    List(EventQuery),
    Create(NewEvent),
    Update { event_id: String, patch: EventPatch },
    Delete { event_id: String },
    Get { event_id: String },
    ListCalendars,
}

impl Request {
    /// Validates the arguments of the selected action.
    pub fn from_cli(cli: &Cli, now: DateTime<Utc>) -> ClientResult<Self> {
        let operation = match cli.action {
            Action::Auth => return Ok(Self::Auth),
            Action::List => Operation::List(EventQuery::from_args(
                cli.max_results,
                cli.time_min.as_deref(),
                cli.time_max.as_deref(),
                now,
            )),
            Action::Create => {
                let (Some(summary), Some(start)) = (non_empty(&cli.summary), non_empty(&cli.start_time))
                else {
                    return Err(ClientError::MissingArgument(
                        "create requires --summary and --start-time".to_string(),
                    ));
                };
                Operation::Create(NewEvent::new(
                    summary,
                    start,
                    cli.end_time.as_deref(),
                    cli.location.clone(),
                    cli.description.clone(),
                )?)
            }
            Action::Update => Operation::Update {
                event_id: required_event_id(cli, "update")?,
                patch: EventPatch::new(
                    cli.summary.clone(),
                    cli.start_time.as_deref(),
                    cli.end_time.as_deref(),
                    cli.location.clone(),
                    cli.description.clone(),
                )?,
            },
            Action::Delete => Operation::Delete {
                event_id: required_event_id(cli, "delete")?,
            },
            Action::Get => Operation::Get {
                event_id: required_event_id(cli, "get")?,
            },
            Action::ListCalendars => Operation::ListCalendars,
        };
        Ok(Self::Calendar(operation))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn required_event_id(cli: &Cli, action: &str) -> ClientResult<String> {
    non_empty(&cli.event_id)
        .map(|id| id.trim().to_string())
        .ok_or_else(|| ClientError::MissingArgument(format!("{} requires --event-id", action)))
}

/// Runs a calendar operation and returns its result document.
pub async fn execute(
    operation: Operation,
    client: &CalendarClient,
    time_zone: &str,
) -> ClientResult<Value> {
    match operation {
        Operation::List(query) => events::list(client, &query).await,
        Operation::Create(event) => events::create(client, &event, time_zone).await,
        Operation::Update { event_id, patch } => {
            events::update(client, &event_id, &patch, time_zone).await
        }
        Operation::Delete { event_id } => events::delete(client, &event_id).await,
        Operation::Get { event_id } => events::get(client, &event_id).await,
        Operation::ListCalendars => calendars::list(client).await,
    }
}
