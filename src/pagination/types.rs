//! Pagination types
//!
//! Defines the cursor values and the per-stream cursor strategy.

use crate::state::{DateWindow, WindowLimits};
use crate::types::Record;
use chrono::NaiveDate;

/// Position to resume a paged extraction from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// Opaque continuation token returned by a list endpoint
    Bookmark(String),
    /// First day of the next date window
    WindowStart(NaiveDate),
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bookmark(token) => f.write_str(token),
            Self::WindowStart(date) => write!(f, "{date}"),
        }
    }
}

/// How a stream advances from one page to the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorStrategy {
    /// Continuation token in the response body, echoed back as a query param
    BodyToken {
        /// JSONPath of the token in the response body
        path: String,
        /// Query parameter carrying the token
        param: String,
        /// Response header consulted when the body has no token
        header_fallback: Option<String>,
    },
    /// The cursor is the start of the next date window
    DateWindow(WindowLimits),
}

impl Default for CursorStrategy {
    fn default() -> Self {
        Self::BodyToken {
            path: "$.bookmark".to_string(),
            param: "bookmark".to_string(),
            header_fallback: Some("X-Next-Page".to_string()),
        }
    }
}

impl CursorStrategy {
    /// Date windows with the default upstream limits
    pub fn date_window() -> Self {
        Self::DateWindow(WindowLimits::default())
    }

    /// Window limits, for date-windowed streams
    pub fn window_limits(&self) -> Option<WindowLimits> {
        match self {
            Self::DateWindow(limits) => Some(*limits),
            Self::BodyToken { .. } => None,
        }
    }
}

/// One fetched page
#[derive(Debug, Clone)]
pub struct Page {
    /// Cursor the page was requested with
    pub cursor: Option<Cursor>,
    /// Date window the page covers, for date-windowed streams
    pub window: Option<DateWindow>,
    /// Records extracted from the body
    pub records: Vec<Record>,
    /// Cursor of the following page; `None` ends the iteration
    pub next: Option<Cursor>,
}
