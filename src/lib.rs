// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Pinterest Ads tap
//!
//! Incremental extraction of Pinterest Ads entities and daily analytics,
//! emitted as schema, record and state messages.
//!
//! ## Features
//!
//! - **Stream hierarchy**: ad accounts → campaigns, ad groups, ads → analytics
//! - **Partitioning**: child streams run once per parent record
//! - **Incremental analytics**: per-partition date bookmarks within the API lookback limit
//! - **Retry**: bounded exponential backoff on 429 and 5xx, one token refresh on 401
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tap_pinterest_ads::config::TapConfig;
//! use tap_pinterest_ads::engine::SyncEngine;
//! use tap_pinterest_ads::output::StdoutSink;
//! use tap_pinterest_ads::state::{BookmarkManager, StateManager};
//! use tap_pinterest_ads::streams::Catalog;
//!
//! let config = TapConfig::from_files(&["config.json"])?;
//! let bookmarks = BookmarkManager::new(
//!     StateManager::from_file("state.json")?,
//!     config.start_date()?,
//!     chrono::Utc::now().date_naive(),
//! );
//! let engine = SyncEngine::new(client, Catalog::pinterest(), bookmarks, Arc::new(StdoutSink::new()))
//!     .with_config(config.sync_config());
//! engine.run(&[]).await?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         SyncEngine                              │
//! │  streams in order → partitions → window → pages → emit → commit │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Paginate    │ Partition │   State     │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Refresh  │ Classify  │ Bookmark token│ Parent    │ Bookmarks   │
//! │ Static   │ Retry     │ Date window   │ replay    │ Windows     │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and response classification
pub mod http;

/// Page iteration
pub mod pagination;

/// Partition contexts and parent replay
pub mod partition;

/// Replication state and bookmarks
pub mod state;

/// Stream definitions
pub mod streams;

/// Schema and catalog generation
pub mod schema;

/// Output messages and sinks
pub mod output;

/// Main execution engine
pub mod engine;

/// Tap configuration
pub mod config;

/// Path template interpolation
pub mod template;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
