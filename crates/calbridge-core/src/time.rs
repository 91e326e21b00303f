//! Date/time arguments supplied on the command line.
//!
//! Callers pass ISO-8601 strings such as `2024-01-15T10:00:00-03:00`. A value
//! either carries a UTC offset ([`InputTime::Zoned`]) or not
//! ([`InputTime::Floating`]); the Calendar API interprets floating values in
//! the `timeZone` sent alongside them.

use chrono::{
    DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc,
};
use thiserror::Error;

/// Formats accepted for values carrying an offset (after `Z` is rewritten).
const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Formats accepted for values without an offset.
const FLOATING_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// A date/time argument that is not valid ISO-8601.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date/time '{input}': use ISO format, e.g. 2024-01-15T10:00:00-03:00")]
pub struct TimeParseError {
    /// The rejected input.
    pub input: String,
}

/// A parsed date/time argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputTime {
    /// A datetime with an explicit UTC offset.
    Zoned(DateTime<FixedOffset>),
    /// A datetime without offset. A date-only input becomes midnight.
    Floating(NaiveDateTime),
}

impl InputTime {
    /// Parses an ISO-8601 date or datetime.
    pub fn parse(input: &str) -> Result<Self, TimeParseError> {
        let trimmed = input.trim();
        let invalid = || TimeParseError {
            input: input.to_string(),
        };

        if trimmed.is_empty() {
            return Err(invalid());
        }

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return Ok(Self::Zoned(dt));
        }

        let with_offset = match trimmed.strip_suffix(['Z', 'z']) {
            Some(rest) => format!("{}+00:00", rest),
            None => trimmed.to_string(),
        };
        for format in ZONED_FORMATS {
            if let Ok(dt) = DateTime::parse_from_str(&with_offset, format) {
                return Ok(Self::Zoned(dt));
            }
        }

        for format in FLOATING_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self::Floating(dt));
            }
        }

        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(Self::Floating)
            .ok_or_else(invalid)
    }

    /// Returns this time shifted by `duration`, keeping the offset (or lack of one).
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        match self {
            Self::Zoned(dt) => dt.checked_add_signed(duration).map(Self::Zoned),
            Self::Floating(dt) => dt.checked_add_signed(duration).map(Self::Floating),
        }
    }

    /// Converts to UTC. Floating values are read as UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            Self::Zoned(dt) => dt.with_timezone(&Utc),
            Self::Floating(dt) => dt.and_utc(),
        }
    }

    /// Formats as ISO-8601, keeping the original offset.
    ///
    /// Fractional seconds are only printed when present.
    pub fn to_iso(&self) -> String {
        match self {
            Self::Zoned(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Self::Floating(dt) if dt.nanosecond() == 0 => {
                dt.format("%Y-%m-%dT%H:%M:%S").to_string()
            }
            Self::Floating(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        }
    }
}

/// Formats a UTC instant the way the Calendar API expects query bounds.
pub fn to_query_bound(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_offset_datetime() {
        let parsed = InputTime::parse("2024-01-15T10:00:00-03:00").unwrap();
        let expected = FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 1, 15, 10, 0, 0)
            .unwrap();
        assert_eq!(parsed, InputTime::Zoned(expected));
        assert_eq!(parsed.to_iso(), "2024-01-15T10:00:00-03:00");
    }

    #[test]
    fn parses_zulu_and_short_forms() {
        let zulu = InputTime::parse("2024-01-15T13:00:00Z").unwrap();
        assert_eq!(zulu.to_utc(), Utc.with_ymd_and_hms(2024, 1, 15, 13, 0, 0).unwrap());

        let no_seconds = InputTime::parse("2024-01-15T13:00Z").unwrap();
        assert_eq!(no_seconds, zulu);

        let with_space = InputTime::parse("2024-01-15 10:00:00-03:00").unwrap();
        assert_eq!(with_space.to_utc(), zulu.to_utc());
    }

    #[test]
    fn parses_floating_and_date_only() {
        let floating = InputTime::parse("2024-01-15T10:30:00").unwrap();
        assert!(matches!(floating, InputTime::Floating(_)));
        assert_eq!(floating.to_iso(), "2024-01-15T10:30:00");

        let date = InputTime::parse("2024-01-15").unwrap();
        assert_eq!(date.to_iso(), "2024-01-15T00:00:00");
    }

    #[test]
    fn keeps_fractional_seconds() {
        let floating = InputTime::parse("2024-01-15T10:30:00.250").unwrap();
        assert_eq!(floating.to_iso(), "2024-01-15T10:30:00.250");
    }

    #[test]
    fn rejects_garbage() {
        for input in ["", "tomorrow", "2024-13-01T10:00:00", "15/01/2024 10:00", "2024-01-15T25:00"] {
            let err = InputTime::parse(input).unwrap_err();
            assert_eq!(err.input, input);
        }
    }

    #[test]
    fn add_hour_keeps_offset() {
        let start = InputTime::parse("2024-01-15T23:30:00-03:00").unwrap();
        let end = start.checked_add(Duration::hours(1)).unwrap();
        assert_eq!(end.to_iso(), "2024-01-16T00:30:00-03:00");

        let floating = InputTime::parse("2024-01-15T10:00:00").unwrap();
        let end = floating.checked_add(Duration::hours(1)).unwrap();
        assert_eq!(end.to_iso(), "2024-01-15T11:00:00");
    }

    #[test]
    fn floating_is_read_as_utc() {
        let floating = InputTime::parse("2024-01-15T10:00:00").unwrap();
        assert_eq!(
            to_query_bound(floating.to_utc()),
            "2024-01-15T10:00:00Z"
        );

        let zoned = InputTime::parse("2024-01-15T10:00:00-03:00").unwrap();
        assert_eq!(to_query_bound(zoned.to_utc()), "2024-01-15T13:00:00Z");
    }
}
