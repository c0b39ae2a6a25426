//! Date windows for date-ranged endpoints

use crate::error::{Error, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};

/// Upstream limits on a date-windowed endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLimits {
    /// How far back from today a request may start
    pub lookback_days: i64,
    /// Maximum span of a single request
    pub max_span_days: i64,
}

impl Default for WindowLimits {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            max_span_days: 100,
        }
    }
}

/// Inclusive date range of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Window beginning at `start`, or `None` when there is nothing to fetch
    ///
    /// The end is `min(start + max_span_days, yesterday)`.
    pub fn starting_at(start: NaiveDate, yesterday: NaiveDate, limits: WindowLimits) -> Option<Self> {
        if start > yesterday {
            return None;
        }

        let end = std::cmp::min(start + Duration::days(limits.max_span_days), yesterday);
        Some(Self { start, end })
    }

    /// Start of the following window, if this one stops short of yesterday
    pub fn next_start(&self, yesterday: NaiveDate) -> Option<NaiveDate> {
        (self.end < yesterday).then(|| self.end + Duration::days(1))
    }

    /// Length of the window in days
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// `start_date` query value
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// `end_date` query value
    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// Parse a bookmark or start date: `YYYY-MM-DD`, RFC 3339, or a naive timestamp
pub fn parse_bookmark(value: &str) -> Result<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(dt.date());
        }
    }

    Err(Error::InvalidBookmark {
        value: value.to_string(),
        message: "expected an ISO-8601 date or timestamp".to_string(),
    })
}

/// Render a date the way the analytics `DATE` field is emitted
pub fn format_bookmark(date: NaiveDate) -> String {
    format!("{}T00:00:00.000000Z", date.format("%Y-%m-%d"))
}
