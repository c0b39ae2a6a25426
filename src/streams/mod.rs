//! Stream definitions
//!
//! Every entity the tap extracts is described by a `StreamSpec`. Streams
//! form a forest through `parent` links:
//!
//! ```text
//! ad_accounts
//! ├── campaigns
//! ├── ad_groups
//! ├── ads
//! │   └── ad_analytics
//! └── account_analytics
//! ```

mod catalog;
pub mod pinterest;
mod spec;

pub use catalog::Catalog;
pub use pinterest::AD_ANALYTICS_COLUMNS;
pub use spec::{
    Column, ColumnType, ParamsBuilder, PostProcess, SkipRule, StreamSpec, DEFAULT_PAGE_SIZE,
};

#[cfg(test)]
mod tests;
