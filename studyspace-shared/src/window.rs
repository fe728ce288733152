use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open time interval `[start, end)` occupied by a booking or requested
/// by an availability query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window from a start instant and a duration in hours.
    /// Fractional hours are allowed; the duration must be positive and finite.
    pub fn new(start: DateTime<Utc>, duration_hours: f64) -> Result<Self, InvalidTimeWindow> {
        if !duration_hours.is_finite() || duration_hours <= 0.0 {
            return Err(InvalidTimeWindow::BadDuration(duration_hours));
        }
        let seconds = (duration_hours * 3600.0).round() as i64;
        Ok(Self {
            start,
            end: start + Duration::seconds(seconds),
        })
    }

    /// Parse a calendar date (`YYYY-MM-DD`) and clock time (`HH:MM`) into a
    /// window of the given duration.
    pub fn parse(date: &str, time: &str, duration_hours: f64) -> Result<Self, InvalidTimeWindow> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| InvalidTimeWindow::BadDate(date.to_string()))?;
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
            .map_err(|_| InvalidTimeWindow::BadTime(time.to_string()))?;
        Self::new(date.and_time(time).and_utc(), duration_hours)
    }

    /// Strict overlap test. Windows that merely touch at an endpoint do not
    /// overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_seconds() as f64 / 3600.0
    }
}

/// Parse a combined `YYYY-MM-DDTHH:MM` instant, the format produced by
/// `datetime-local` form inputs.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, InvalidTimeWindow> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| InvalidTimeWindow::BadInstant(s.to_string()))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidTimeWindow {
    #[error("unparseable date: {0}")]
    BadDate(String),

    #[error("unparseable time: {0}")]
    BadTime(String),

    #[error("unparseable instant: {0}")]
    BadInstant(String),

    #[error("duration must be a positive number of hours, got {0}")]
    BadDuration(f64),
}
