//! Declarative stream definitions
//!
//! A `StreamSpec` is plain data. Everything that differs between streams
//! (request parameters, post-processing, skip rules) is a small tagged
//! variant interpreted by the engine.

use crate::http::StatusOverrides;
use crate::pagination::CursorStrategy;
use crate::partition::{ContextProjection, PartitionContext};
use crate::state::DateWindow;
use crate::types::{JsonValue, Record, ReplicationMethod};
use std::collections::BTreeMap;

/// Default `page_size` sent with every request
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Output type of a column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Number,
    Boolean,
    DateTime,
    Array(Box<ColumnType>),
    Object(Vec<Column>),
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    /// Create a column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::String)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::DateTime)
    }

    pub fn string_array(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Array(Box::new(ColumnType::String)))
    }

    pub fn object(name: impl Into<String>, fields: Vec<Column>) -> Self {
        Self::new(name, ColumnType::Object(fields))
    }
}

/// How request query parameters are built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamsBuilder {
    /// `page_size` only; the cursor parameter is added by the iterator
    List,
    /// Date-windowed metrics request
    Analytics {
        /// Metric columns requested, comma-joined on the wire
        columns: Vec<String>,
        /// Row granularity
        granularity: String,
    },
}

impl ParamsBuilder {
    /// Analytics parameters at daily granularity
    pub fn analytics(columns: &[&str]) -> Self {
        Self::Analytics {
            columns: columns.iter().map(|c| (*c).to_string()).collect(),
            granularity: "DAY".to_string(),
        }
    }

    /// Build the query parameters for one request
    pub fn build(&self, page_size: u32, window: Option<&DateWindow>) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        params.insert("page_size".to_string(), page_size.to_string());

        if let Self::Analytics {
            columns,
            granularity,
        } = self
        {
            if let Some(window) = window {
                params.insert("start_date".to_string(), window.start_param());
                params.insert("end_date".to_string(), window.end_param());
            }
            params.insert("granularity".to_string(), granularity.clone());
            params.insert("columns".to_string(), columns.join(","));
        }

        params
    }
}

/// Per-record transformation applied before emission
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PostProcess {
    #[default]
    None,
    /// Reformat a `YYYY-MM-DD` field as a midnight UTC timestamp
    DateToTimestamp { field: String },
}

impl PostProcess {
    /// Apply the transformation in place
    pub fn apply(&self, record: &mut Record) {
        match self {
            Self::None => {}
            Self::DateToTimestamp { field } => {
                if let Some(JsonValue::String(value)) = record.get_mut(field) {
                    if value.len() == 10 {
                        *value = format!("{value}T00:00:00.000000Z");
                    }
                }
            }
        }
    }
}

/// Rule for skipping partitions once a backfill has completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipRule {
    /// Context field carrying the entity status
    pub field: String,
    /// The only status still extracted after backfill
    pub keep: String,
}

impl SkipRule {
    /// Skip every partition whose `field` is present and not `keep`
    pub fn unless(field: impl Into<String>, keep: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            keep: keep.into(),
        }
    }

    /// Whether the partition should be skipped
    pub fn should_skip(&self, ctx: &PartitionContext, is_backfilled: bool) -> bool {
        is_backfilled && ctx.get(&self.field).is_some_and(|status| status != self.keep)
    }
}

/// Immutable definition of one stream
#[derive(Debug, Clone)]
pub struct StreamSpec {
    /// Stream name
    pub name: String,
    /// Request path with `{placeholder}` segments
    pub path_template: String,
    /// Primary key fields
    pub primary_key: Vec<String>,
    /// Replication key; presence makes the stream incremental
    pub replication_key: Option<String>,
    /// Parent stream name
    pub parent: Option<String>,
    /// JSONPath locating records in a response body
    pub records_path: String,
    /// Pagination cursor strategy
    pub cursor: CursorStrategy,
    /// Output columns
    pub columns: Vec<Column>,
    /// Query parameter builder
    pub params: ParamsBuilder,
    /// Response classification overrides
    pub overrides: StatusOverrides,
    /// Projection handed to child streams
    pub child_context: ContextProjection,
    /// Context fields that identify a partition in state (`None` = all)
    pub state_partition_keys: Option<Vec<String>>,
    /// Skip rule applied when the backfill flag is set
    pub skip_rule: Option<SkipRule>,
    /// Per-record transformation
    pub post_process: PostProcess,
    /// Page size override
    pub page_size: Option<u32>,
}

impl StreamSpec {
    /// Create a root list stream with `$.items[*]` records and bookmark pagination
    pub fn new(name: impl Into<String>, path_template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path_template: path_template.into(),
            primary_key: vec!["id".to_string()],
            replication_key: None,
            parent: None,
            records_path: "$.items[*]".to_string(),
            cursor: CursorStrategy::default(),
            columns: Vec::new(),
            params: ParamsBuilder::List,
            overrides: StatusOverrides::none(),
            child_context: ContextProjection::default(),
            state_partition_keys: None,
            skip_rule: None,
            post_process: PostProcess::None,
            page_size: None,
        }
    }

    /// Set the parent stream
    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the primary key
    #[must_use]
    pub fn primary_key(mut self, keys: &[&str]) -> Self {
        self.primary_key = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    /// Set the replication key
    #[must_use]
    pub fn replication_key(mut self, key: impl Into<String>) -> Self {
        self.replication_key = Some(key.into());
        self
    }

    /// Set the records path
    #[must_use]
    pub fn records_path(mut self, path: impl Into<String>) -> Self {
        self.records_path = path.into();
        self
    }

    /// Set the cursor strategy
    #[must_use]
    pub fn cursor(mut self, cursor: CursorStrategy) -> Self {
        self.cursor = cursor;
        self
    }

    /// Set the output columns
    #[must_use]
    pub fn columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Set the parameter builder
    #[must_use]
    pub fn params(mut self, params: ParamsBuilder) -> Self {
        self.params = params;
        self
    }

    /// Set the classification overrides
    #[must_use]
    pub fn overrides(mut self, overrides: StatusOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Set the projection handed to child streams
    #[must_use]
    pub fn child_context(mut self, projection: ContextProjection) -> Self {
        self.child_context = projection;
        self
    }

    /// Restrict the partition identity to the given context fields
    #[must_use]
    pub fn state_partition_keys(mut self, keys: &[&str]) -> Self {
        self.state_partition_keys = Some(keys.iter().map(|k| (*k).to_string()).collect());
        self
    }

    /// Set the skip rule
    #[must_use]
    pub fn skip_rule(mut self, rule: SkipRule) -> Self {
        self.skip_rule = Some(rule);
        self
    }

    /// Set the post-processing step
    #[must_use]
    pub fn post_process(mut self, post_process: PostProcess) -> Self {
        self.post_process = post_process;
        self
    }

    /// Replication method implied by the replication key
    pub fn replication_method(&self) -> ReplicationMethod {
        if self.replication_key.is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        }
    }

    /// Whether the stream keeps bookmarks
    pub fn is_incremental(&self) -> bool {
        self.replication_key.is_some()
    }

    /// Page size for this stream
    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    /// Canonical key identifying a partition in persisted state
    pub fn state_key(&self, ctx: &PartitionContext) -> String {
        ctx.state_key(self.state_partition_keys.as_deref())
    }

    /// Whether a partition is skipped under the backfill flag
    pub fn should_skip(&self, ctx: &PartitionContext, is_backfilled: bool) -> bool {
        self.skip_rule
            .as_ref()
            .is_some_and(|rule| rule.should_skip(ctx, is_backfilled))
    }

    /// Shape a raw record for emission
    ///
    /// Keeps only declared columns (all fields when none are declared), then
    /// applies the post-processing step.
    pub fn shape(&self, mut record: Record) -> Record {
        if !self.columns.is_empty() {
            record.retain(|key, _| self.columns.iter().any(|c| c.name == *key));
        }
        self.post_process.apply(&mut record);
        record
    }
}
