//! Price points and series resolutions.
//!
//! A series is a `Vec<PricePoint>` for one instrument at one resolution,
//! sorted ascending and unique by timestamp. Matching an axis instant to a
//! series is tolerance-bounded: a position instant with no point close enough
//! simply has no price at that moment.

use crate::domain::error::FoliovalError;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::str::FromStr;

/// One close observation for an instrument at one resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Price-series granularity. Codes match the store naming (H/D/W/M).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    Hour,
    Day,
    Week,
    Month,
}

impl Resolution {
    pub const ALL: [Resolution; 4] = [
        Resolution::Hour,
        Resolution::Day,
        Resolution::Week,
        Resolution::Month,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Resolution::Hour => "H",
            Resolution::Day => "D",
            Resolution::Week => "W",
            Resolution::Month => "M",
        }
    }

    /// Maximum distance allowed when matching an instant to a price point.
    pub fn tolerance(&self) -> Duration {
        match self {
            Resolution::Hour => Duration::hours(1),
            _ => Duration::days(1),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Resolution {
    type Err = FoliovalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "H" => Ok(Resolution::Hour),
            "D" => Ok(Resolution::Day),
            "W" => Ok(Resolution::Week),
            "M" => Ok(Resolution::Month),
            other => Err(FoliovalError::UnknownResolution {
                token: other.to_string(),
            }),
        }
    }
}

/// Close of the point nearest to `at`, at most `tolerance` away.
///
/// `points` must be sorted ascending by timestamp. A tie between the neighbor
/// before and the neighbor after prefers the earlier point.
pub fn closest_close(
    points: &[PricePoint],
    at: DateTime<Utc>,
    tolerance: Duration,
) -> Option<f64> {
    let idx = points.partition_point(|p| p.timestamp < at);

    let before = idx.checked_sub(1).map(|i| &points[i]);
    let after = points.get(idx);

    let nearest = match (before, after) {
        (Some(b), Some(a)) => {
            if (at - b.timestamp) <= (a.timestamp - at) {
                b
            } else {
                a
            }
        }
        (Some(b), None) => b,
        (None, Some(a)) => a,
        (None, None) => return None,
    };

    if (at - nearest.timestamp).abs() <= tolerance {
        Some(nearest.close)
    } else {
        None
    }
}
