//! Tests for stream definitions

use super::*;
use crate::http::{classify, ResponseClass};
use crate::partition::PartitionContext;
use crate::state::{DateWindow, WindowLimits};
use crate::types::{Record, ReplicationMethod};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn test_declared_order() {
    let catalog = Catalog::pinterest();
    assert_eq!(
        catalog.names(),
        vec![
            "ad_accounts",
            "campaigns",
            "ad_groups",
            "ads",
            "ad_analytics",
            "account_analytics"
        ]
    );
}

#[test]
fn test_stream_keys() {
    let catalog = Catalog::pinterest();

    for name in ["ad_accounts", "campaigns", "ad_groups", "ads"] {
        let stream = catalog.get(name).unwrap();
        assert_eq!(stream.primary_key, vec!["id"]);
        assert_eq!(stream.replication_method(), ReplicationMethod::FullTable);
    }

    let ad_analytics = catalog.get("ad_analytics").unwrap();
    assert_eq!(ad_analytics.primary_key, vec!["AD_ID", "DATE"]);
    assert_eq!(ad_analytics.replication_key.as_deref(), Some("DATE"));
    assert_eq!(ad_analytics.replication_method(), ReplicationMethod::Incremental);

    let account_analytics = catalog.get("account_analytics").unwrap();
    assert_eq!(account_analytics.primary_key, vec!["AD_ACCOUNT_ID", "DATE"]);
    assert_eq!(account_analytics.parent.as_deref(), Some("ad_accounts"));
}

#[test]
fn test_unknown_stream() {
    let err = Catalog::pinterest().get("pins").unwrap_err();
    assert!(matches!(err, crate::error::Error::StreamNotFound { .. }));
}

#[test]
fn test_ancestors() {
    let catalog = Catalog::pinterest();
    let names: Vec<&str> = catalog
        .ancestors("ad_analytics")
        .unwrap()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, vec!["ads", "ad_accounts"]);
    assert!(catalog.ancestors("ad_accounts").unwrap().is_empty());
}

#[test]
fn test_select_keeps_declared_order() {
    let catalog = Catalog::pinterest();
    let selected: Vec<&str> = catalog
        .select(&["ad_analytics".to_string(), "campaigns".to_string()])
        .unwrap()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(selected, vec!["campaigns", "ad_analytics"]);

    assert_eq!(catalog.select(&[]).unwrap().len(), 6);
    assert!(catalog.select(&["nope".to_string()]).is_err());
}

#[test]
fn test_catalog_rejects_undeclared_parent() {
    let err = Catalog::new(vec![
        StreamSpec::new("child", "child").parent("parent"),
        StreamSpec::new("parent", "parent"),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("not declared before it"));
}

#[test]
fn test_catalog_rejects_duplicates() {
    let err = Catalog::new(vec![
        StreamSpec::new("a", "a"),
        StreamSpec::new("a", "a"),
    ])
    .unwrap_err();
    assert!(err.to_string().contains("declared twice"));
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn test_list_params() {
    let params = ParamsBuilder::List.build(100, None);
    assert_eq!(params.len(), 1);
    assert_eq!(params["page_size"], "100");
}

#[test]
fn test_analytics_params() {
    let stream = pinterest::ad_analytics();
    let window =
        DateWindow::starting_at(date("2023-01-01"), date("2023-01-19"), WindowLimits::default());
    let params = stream.params.build(stream.page_size(), window.as_ref());

    assert_eq!(params["start_date"], "2023-01-01");
    assert_eq!(params["end_date"], "2023-01-19");
    assert_eq!(params["granularity"], "DAY");
    assert_eq!(params["page_size"], "100");
    assert_eq!(params["columns"], AD_ANALYTICS_COLUMNS.join(","));
    assert!(params["columns"].starts_with("SPEND_IN_DOLLAR,ECPC_IN_DOLLAR,"));
}

#[test]
fn test_account_analytics_columns_drop_entity_ids() {
    let columns = pinterest::account_analytics_columns();
    assert!(columns.contains(&"AD_ACCOUNT_ID"));
    assert!(columns.contains(&"SPEND_IN_DOLLAR"));
    assert!(!columns.contains(&"AD_ID"));
    assert!(!columns.contains(&"CAMPAIGN_ID"));
}

// ============================================================================
// Classification overrides
// ============================================================================

#[test]
fn test_analytics_overrides_match_default_net_classification() {
    let overrides = pinterest::ad_analytics().overrides;
    for status in [200, 429, 400, 404, 500, 503] {
        assert_eq!(
            classify(status, &overrides),
            classify(status, &crate::http::StatusOverrides::none())
        );
    }
    assert_eq!(classify(429, &overrides), ResponseClass::Retriable);
    assert!(!overrides.include_body);
}

// ============================================================================
// Shaping and skip rules
// ============================================================================

#[test]
fn test_shape_keeps_declared_columns() {
    let stream = pinterest::ad_accounts();
    let shaped = stream.shape(record(json!({
        "id": "A1",
        "name": "Acme",
        "permissions": ["ADMIN"],
        "owner": {"username": "acme"}
    })));

    assert_eq!(
        shaped,
        record(json!({"id": "A1", "name": "Acme", "owner": {"username": "acme"}}))
    );
}

#[test]
fn test_shape_reformats_analytics_date() {
    let stream = pinterest::ad_analytics();
    let shaped = stream.shape(record(json!({
        "AD_ID": "X1",
        "DATE": "2023-01-05",
        "SPEND_IN_DOLLAR": 1.5
    })));

    assert_eq!(shaped["DATE"], "2023-01-05T00:00:00.000000Z");
    assert_eq!(shaped["SPEND_IN_DOLLAR"], 1.5);
}

#[test]
fn test_shape_without_columns_keeps_everything() {
    let stream = StreamSpec::new("raw", "raw");
    let input = record(json!({"a": 1, "b": 2}));
    assert_eq!(stream.shape(input.clone()), input);
}

#[test]
fn test_skip_rule() {
    let stream = pinterest::ad_analytics();
    let paused = PartitionContext::new().with("ad_status", "PAUSED");
    let active = PartitionContext::new().with("ad_status", "ACTIVE");
    let unknown = PartitionContext::new();

    assert!(stream.should_skip(&paused, true));
    assert!(!stream.should_skip(&paused, false));
    assert!(!stream.should_skip(&active, true));
    assert!(!stream.should_skip(&unknown, true));
    assert!(!pinterest::campaigns().should_skip(&paused, true));
}

#[test]
fn test_state_key_ignores_status() {
    let stream = pinterest::ad_analytics();
    let active = PartitionContext::new()
        .with("ad_account_id", "A1")
        .with("ad_id", "X1")
        .with("ad_status", "ACTIVE");
    let paused = PartitionContext::new()
        .with("ad_account_id", "A1")
        .with("ad_id", "X1")
        .with("ad_status", "PAUSED");

    assert_eq!(stream.state_key(&active), stream.state_key(&paused));
}
