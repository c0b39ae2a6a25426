//! State types for tracking replication progress
//!
//! These types are serialized to JSON and persisted between runs:
//!
//! ```json
//! {
//!   "bookmarks": {
//!     "ad_analytics": {
//!       "partitions": {
//!         "{\"ad_account_id\":\"A1\",\"ad_id\":\"X1\"}": {
//!           "context": {"ad_account_id": "A1", "ad_id": "X1"},
//!           "replication_key": "DATE",
//!           "replication_key_value": "2023-01-19T00:00:00.000000Z"
//!         }
//!       }
//!     }
//!   }
//! }
//! ```

use super::window::parse_bookmark;
use crate::partition::PartitionContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Complete persisted state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Per-stream bookmarks
    #[serde(default)]
    pub bookmarks: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a stream
    pub fn get_stream(&self, stream: &str) -> Option<&StreamState> {
        self.bookmarks.get(stream)
    }

    /// Get mutable state for a stream, creating if needed
    pub fn get_stream_mut(&mut self, stream: &str) -> &mut StreamState {
        self.bookmarks.entry(stream.to_string()).or_default()
    }

    /// Get the bookmark value of a partition
    pub fn bookmark(&self, stream: &str, partition_key: &str) -> Option<&str> {
        self.get_stream(stream)?
            .partitions
            .get(partition_key)
            .map(|p| p.replication_key_value.as_str())
    }

    /// Advance a partition's bookmark, never moving it backwards
    ///
    /// Returns `false` when the existing bookmark is already later.
    pub fn advance(
        &mut self,
        stream: &str,
        partition_key: &str,
        partition: PartitionState,
    ) -> bool {
        let stream_state = self.get_stream_mut(stream);

        if let Some(existing) = stream_state.partitions.get(partition_key) {
            let regresses = match (
                parse_bookmark(&existing.replication_key_value),
                parse_bookmark(&partition.replication_key_value),
            ) {
                (Ok(old), Ok(new)) => new < old,
                _ => partition.replication_key_value < existing.replication_key_value,
            };
            if regresses {
                warn!(
                    "Refusing to move bookmark for {stream} {partition_key} back from {} to {}",
                    existing.replication_key_value, partition.replication_key_value
                );
                return false;
            }
        }

        stream_state
            .partitions
            .insert(partition_key.to_string(), partition);
        true
    }

    /// Merge another state on top of this one without regressing any bookmark
    pub fn merge(&mut self, other: State) {
        for (stream, stream_state) in other.bookmarks {
            for (key, partition) in stream_state.partitions {
                self.advance(&stream, &key, partition);
            }
        }
    }
}

/// State for a single stream
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamState {
    /// Bookmarks keyed by canonical partition key
    #[serde(default)]
    pub partitions: BTreeMap<String, PartitionState>,
}

/// Bookmark of a single partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionState {
    /// The identifying part of the partition context
    #[serde(default)]
    pub context: PartitionContext,
    /// Field the bookmark tracks
    pub replication_key: String,
    /// Last committed value
    pub replication_key_value: String,
}

impl PartitionState {
    /// Create a partition bookmark
    pub fn new(
        context: PartitionContext,
        replication_key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            context,
            replication_key: replication_key.into(),
            replication_key_value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(value: &str) -> PartitionState {
        PartitionState::new(PartitionContext::new().with("ad_id", "X1"), "DATE", value)
    }

    #[test]
    fn test_state_default() {
        let state = State::new();
        assert!(state.bookmarks.is_empty());
        assert!(state.bookmark("ad_analytics", "k").is_none());
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut state = State::new();

        assert!(state.advance("ad_analytics", "k", bookmark("2023-01-10")));
        assert!(state.advance("ad_analytics", "k", bookmark("2023-01-12T00:00:00.000000Z")));
        assert!(!state.advance("ad_analytics", "k", bookmark("2023-01-11")));

        assert_eq!(
            state.bookmark("ad_analytics", "k"),
            Some("2023-01-12T00:00:00.000000Z")
        );
    }

    #[test]
    fn test_merge_keeps_later_bookmarks() {
        let mut prior = State::new();
        prior.advance("ad_analytics", "a", bookmark("2023-01-10"));
        prior.advance("ad_analytics", "b", bookmark("2023-01-10"));

        let mut update = State::new();
        update.advance("ad_analytics", "a", bookmark("2023-01-05"));
        update.advance("ad_analytics", "b", bookmark("2023-01-15"));
        update.advance("account_analytics", "c", bookmark("2023-01-01"));

        prior.merge(update);

        assert_eq!(prior.bookmark("ad_analytics", "a"), Some("2023-01-10"));
        assert_eq!(prior.bookmark("ad_analytics", "b"), Some("2023-01-15"));
        assert_eq!(prior.bookmark("account_analytics", "c"), Some("2023-01-01"));
    }

    #[test]
    fn test_state_serialization() {
        let mut state = State::new();
        state.advance("ad_analytics", "k", bookmark("2023-01-19"));

        let json = serde_json::to_string(&state).unwrap();
        let restored: State = serde_json::from_str(&json).unwrap();

        assert_eq!(restored, state);
        assert_eq!(restored.bookmark("ad_analytics", "k"), Some("2023-01-19"));
    }

    #[test]
    fn test_empty_object_parses() {
        let state: State = serde_json::from_str("{}").unwrap();
        assert!(state.bookmarks.is_empty());
    }
}
