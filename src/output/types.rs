//! Output message types

use crate::schema::JsonSchema;
use crate::state::State;
use crate::types::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message on the tap's output stream
///
/// Serialized as one JSON object per line, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Record schema, emitted before the first record of a stream
    Schema {
        stream: String,
        schema: JsonSchema,
        key_properties: Vec<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        bookmark_properties: Vec<String>,
    },
    /// One shaped record
    Record {
        stream: String,
        record: Record,
        time_extracted: DateTime<Utc>,
    },
    /// Full replication state
    State { value: State },
}

impl Message {
    /// Create a schema message
    pub fn schema(
        stream: impl Into<String>,
        schema: JsonSchema,
        key_properties: Vec<String>,
        bookmark_properties: Vec<String>,
    ) -> Self {
        Self::Schema {
            stream: stream.into(),
            schema,
            key_properties,
            bookmark_properties,
        }
    }

    /// Create a record message stamped now
    pub fn record(stream: impl Into<String>, record: Record) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted: Utc::now(),
        }
    }

    /// Create a state message
    pub fn state(value: State) -> Self {
        Self::State { value }
    }

    /// Stream the message belongs to, if any
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::State { .. } => None,
        }
    }

    /// Check if this is a schema message
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema { .. })
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }
}
