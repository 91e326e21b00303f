//! Command-line interface definition.

use clap::{Parser, ValueEnum};

use calbridge_core::{TracingConfig, TracingOutputFormat};
use calbridge_providers::google::DEFAULT_MAX_RESULTS;

/// calbridge - Google Calendar operations as JSON
#[derive(Debug, Parser)]
#[command(name = "calbridge")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Exit status: 0 when a result document was printed on stdout, \
including operation errors (invalid_time_format, remote_api_error, unexpected_error); \
1 for fatal errors, which are printed on stderr.")]
pub struct Cli {
    /// Operation to run
    #[arg(value_enum)]
    pub action: Action,

    /// Enable debug logging on stderr
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Format of the log lines on stderr
    #[arg(long, value_enum, env = "CALBRIDGE_LOG_FORMAT", default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    // --- Listing ---
    /// Maximum number of events to list
    #[arg(long, default_value_t = DEFAULT_MAX_RESULTS)]
    pub max_results: u32,

    /// Lower bound of the listing (ISO format)
    #[arg(long)]
    pub time_min: Option<String>,

    /// Upper bound of the listing (ISO format)
    #[arg(long)]
    pub time_max: Option<String>,

    // --- Event fields ---
    /// Event title
    #[arg(long)]
    pub summary: Option<String>,

    /// Event start (ISO format, e.g. 2024-01-15T10:00:00-03:00)
    #[arg(long)]
    pub start_time: Option<String>,

    /// Event end (ISO format); defaults to one hour after the start
    #[arg(long)]
    pub end_time: Option<String>,

    /// Event location
    #[arg(long)]
    pub location: Option<String>,

    /// Event description
    #[arg(long)]
    pub description: Option<String>,

    /// Event ID
    #[arg(long)]
    pub event_id: Option<String>,
}

impl Cli {
    /// Tracing setup selected by `--debug` and `--log-format`.
    pub fn tracing_config(&self) -> TracingConfig {
        let base = if self.debug {
            TracingConfig::cli_debug()
        } else {
            TracingConfig::default()
        };
        match self.log_format {
            LogFormat::Compact => base,
            LogFormat::Pretty => base.with_format(TracingOutputFormat::Pretty),
            LogFormat::Json => TracingConfig::structured().with_level(base.default_level),
        }
    }
}

/// Log line formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Pretty,
    /// One JSON object per line, for hosts that index stderr
    Json,
}

/// Available operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// List upcoming events
    List,
    /// Create an event
    Create,
    /// Update fields of an existing event
    Update,
    /// Delete an event
    Delete,
    /// Show one event
    Get,
    /// List the calendars of the account
    #[value(name = "list_calendars")]
    ListCalendars,
    /// Authorize (or refresh) and print the token
    Auth,
}
