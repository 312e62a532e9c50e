//! Charting range tokens.
//!
//! A range controls two things downstream: which resolution the valuation
//! axis uses and how far back from `now` the axis is filtered. `MAX` is the
//! unfiltered full history.

use crate::domain::error::FoliovalError;
use chrono::{DateTime, Duration, Months, Utc};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRange {
    OneDay,
    OneWeek,
    OneMonth,
    OneYear,
    Max,
}

impl TimeRange {
    pub const ALL: [TimeRange; 5] = [
        TimeRange::OneDay,
        TimeRange::OneWeek,
        TimeRange::OneMonth,
        TimeRange::OneYear,
        TimeRange::Max,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            TimeRange::OneDay => "1D",
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::OneYear => "1Y",
            TimeRange::Max => "MAX",
        }
    }

    /// Inclusive lower bound of the charting window; `None` keeps everything.
    ///
    /// Week spans are a flat 7 days; month and year spans are calendar
    /// subtraction with end-of-month clamping.
    pub fn window_start(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeRange::OneDay => Some(now - Duration::days(1)),
            TimeRange::OneWeek => Some(now - Duration::days(7)),
            TimeRange::OneMonth => Some(
                now.checked_sub_months(Months::new(1))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
            TimeRange::OneYear => Some(
                now.checked_sub_months(Months::new(12))
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            ),
            TimeRange::Max => None,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for TimeRange {
    type Err = FoliovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(TimeRange::OneDay),
            "1W" => Ok(TimeRange::OneWeek),
            "1M" => Ok(TimeRange::OneMonth),
            "1Y" => Ok(TimeRange::OneYear),
            "MAX" => Ok(TimeRange::Max),
            other => Err(FoliovalError::UnknownRange {
                token: other.to_string(),
            }),
        }
    }
}
