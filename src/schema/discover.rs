//! Catalog discovery
//!
//! Builds record schemas from the declared column sets and wraps them in
//! catalog entries.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use crate::streams::{Catalog, Column, ColumnType, StreamSpec};
use crate::types::ReplicationMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Schema of a single column type
///
/// Every column is nullable: the API omits unset fields.
pub fn column_property(column_type: &ColumnType) -> SchemaProperty {
    match column_type {
        ColumnType::String => SchemaProperty::nullable(JsonType::String),
        ColumnType::Number => SchemaProperty::nullable(JsonType::Number),
        ColumnType::Boolean => SchemaProperty::nullable(JsonType::Boolean),
        ColumnType::DateTime => {
            SchemaProperty::nullable(JsonType::String).with_format("date-time")
        }
        ColumnType::Array(items) => SchemaProperty::array(column_property(items)),
        ColumnType::Object(fields) => SchemaProperty::object(properties_of(fields)),
    }
}

fn properties_of(columns: &[Column]) -> BTreeMap<String, SchemaProperty> {
    columns
        .iter()
        .map(|c| (c.name.clone(), column_property(&c.column_type)))
        .collect()
}

/// Record schema of a stream
///
/// Primary key columns are listed as required.
pub fn stream_schema(stream: &StreamSpec) -> JsonSchema {
    let mut schema = JsonSchema::new();
    for column in &stream.columns {
        schema.add_property(&column.name, column_property(&column.column_type));
    }
    for key in &stream.primary_key {
        if schema.get_property(key).is_some() {
            schema.add_required(key);
        }
    }
    schema
}

/// Discovery output for one stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub tap_stream_id: String,
    pub stream: String,
    pub key_properties: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,
    pub replication_method: ReplicationMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_stream: Option<String>,
    pub schema: JsonSchema,
}

impl CatalogEntry {
    /// Describe a stream
    pub fn from_stream(stream: &StreamSpec) -> Self {
        Self {
            tap_stream_id: stream.name.clone(),
            stream: stream.name.clone(),
            key_properties: stream.primary_key.clone(),
            replication_key: stream.replication_key.clone(),
            replication_method: stream.replication_method(),
            parent_stream: stream.parent.clone(),
            schema: stream_schema(stream),
        }
    }
}

/// Discovery output for every stream, in declared order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredCatalog {
    pub streams: Vec<CatalogEntry>,
}

impl DiscoveredCatalog {
    /// Describe every stream of a catalog
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            streams: catalog
                .streams()
                .iter()
                .map(CatalogEntry::from_stream)
                .collect(),
        }
    }

    /// Look up an entry by stream name
    pub fn get(&self, stream: &str) -> Option<&CatalogEntry> {
        self.streams.iter().find(|e| e.stream == stream)
    }
}
