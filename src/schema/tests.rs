//! Schema generation tests

use super::*;
use crate::streams::{pinterest, Catalog, Column, ColumnType, StreamSpec};
use crate::types::ReplicationMethod;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_scalar_columns_are_nullable() {
    for (column_type, expected) in [
        (ColumnType::String, JsonType::String),
        (ColumnType::Number, JsonType::Number),
        (ColumnType::Boolean, JsonType::Boolean),
    ] {
        let prop = column_property(&column_type);
        assert!(prop.is_nullable());
        assert_eq!(prop.json_type.primary_type(), Some(&expected));
        assert_eq!(prop.format, None);
    }
}

#[test]
fn test_datetime_column() {
    let prop = column_property(&ColumnType::DateTime);
    assert_eq!(
        serde_json::to_value(&prop).unwrap(),
        json!({"type": ["string", "null"], "format": "date-time"})
    );
}

#[test]
fn test_nested_columns() {
    let column = Column::object(
        "tracking_urls",
        vec![Column::string_array("click"), Column::string("note")],
    );
    let prop = column_property(&column.column_type);

    assert_eq!(
        serde_json::to_value(&prop).unwrap(),
        json!({
            "type": ["object", "null"],
            "properties": {
                "click": {"type": ["array", "null"], "items": {"type": ["string", "null"]}},
                "note": {"type": ["string", "null"]}
            }
        })
    );
}

#[test]
fn test_stream_schema_requires_primary_key() {
    let schema = stream_schema(&pinterest::ad_analytics());

    assert_eq!(schema.json_type, JsonType::Object);
    assert_eq!(schema.required, vec!["AD_ID", "DATE"]);
    assert_eq!(
        schema.get_property("DATE").unwrap().format.as_deref(),
        Some("date-time")
    );
    assert_eq!(
        schema
            .get_property("SPEND_IN_DOLLAR")
            .unwrap()
            .json_type
            .primary_type(),
        Some(&JsonType::Number)
    );
}

#[test]
fn test_stream_without_columns() {
    let schema = stream_schema(&StreamSpec::new("raw", "raw"));
    assert!(schema.properties.is_empty());
    assert!(schema.required.is_empty());
    assert_eq!(
        schema.to_json(),
        json!({"type": "object", "properties": {}, "additionalProperties": true})
    );
}

#[test]
fn test_catalog_entry() {
    let entry = CatalogEntry::from_stream(&pinterest::ads());

    assert_eq!(entry.stream, "ads");
    assert_eq!(entry.tap_stream_id, "ads");
    assert_eq!(entry.key_properties, vec!["id"]);
    assert_eq!(entry.replication_key, None);
    assert_eq!(entry.replication_method, ReplicationMethod::FullTable);
    assert_eq!(entry.parent_stream.as_deref(), Some("ad_accounts"));

    let value = serde_json::to_value(&entry).unwrap();
    assert_eq!(value["replication_method"], "FULL_TABLE");
    assert!(value.get("replication_key").is_none());
}

#[test]
fn test_discovered_catalog_keeps_declared_order() {
    let discovered = DiscoveredCatalog::from_catalog(&Catalog::pinterest());
    let names: Vec<&str> = discovered.streams.iter().map(|e| e.stream.as_str()).collect();

    assert_eq!(
        names,
        vec![
            "ad_accounts",
            "campaigns",
            "ad_groups",
            "ads",
            "ad_analytics",
            "account_analytics"
        ]
    );

    let analytics = discovered.get("account_analytics").unwrap();
    assert_eq!(analytics.replication_key.as_deref(), Some("DATE"));
    assert_eq!(analytics.replication_method, ReplicationMethod::Incremental);
    assert!(discovered.get("pins").is_none());
}
