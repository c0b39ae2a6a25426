//! State management module
//!
//! Handles per-partition bookmarks, request windows and persistence.
//! State is persisted between runs to enable incremental extraction.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Per-stream, per-partition bookmarks
//! - `StateManager` - File-based state persistence with atomic writes
//! - `BookmarkManager` - Window computation and write-after-success commits
//! - `DateWindow` - Inclusive date range of one analytics request

mod bookmarks;
mod manager;
mod types;
mod window;

pub use bookmarks::BookmarkManager;
pub use manager::StateManager;
pub use types::{PartitionState, State, StreamState};
pub use window::{format_bookmark, parse_bookmark, DateWindow, WindowLimits};
