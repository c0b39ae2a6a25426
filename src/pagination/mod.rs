//! Pagination module
//!
//! Supports: body bookmark tokens (with header fallback), date windows
//!
//! # Overview
//!
//! A `PageIterator` walks one partition of one stream: it builds request
//! parameters from the stream's parameter builder and the current cursor,
//! issues the call through the retrying HTTP client, extracts records with
//! the stream's records path, and derives the next cursor. Iteration ends
//! when no next cursor is found.
//!
//! For date-windowed streams the cursor is the start of the next window, so
//! pagination and replication progress move together.

mod extract;
mod iterator;
mod types;

pub use extract::{extract_records, extract_token, find_all};
pub use iterator::PageIterator;
pub use types::{Cursor, CursorStrategy, Page};

#[cfg(test)]
mod tests;
