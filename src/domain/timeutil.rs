//! Instant parsing and formatting.
//!
//! Everything on disk and on the wire is RFC 3339 in UTC. Daily and coarser
//! price files often carry bare dates, so parsing accepts `YYYY-MM-DD` as
//! midnight UTC.

use crate::domain::error::FoliovalError;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Parse an RFC 3339 instant, or a bare `YYYY-MM-DD` date as midnight UTC.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, FoliovalError> {
    let trimmed = input.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(instant.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(FoliovalError::InvalidInstant {
        input: trimmed.to_string(),
    })
}

/// RFC 3339 with seconds precision and a `Z` suffix.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}
