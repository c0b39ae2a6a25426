//! Partition resolution module
//!
//! A child stream runs once per record of its parent. The parent exposes a
//! record-to-context projection; the resolver replays the parent's own
//! extraction (recursively, up to the root) and projects each record.
//!
//! No caching or deduplication happens: sibling streams sharing a parent
//! each replay it, so parent linkage is always fresh.

mod resolver;
mod types;

pub use resolver::{PartitionResolver, RecordSource};
pub use types::{ContextField, ContextProjection, PartitionContext};

#[cfg(test)]
mod tests;
