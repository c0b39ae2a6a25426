//! Tests for the partition module

use super::*;
use crate::error::{Error, Result};
use crate::streams::{pinterest, Catalog, StreamSpec};
use crate::types::Record;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;

fn record(value: serde_json::Value) -> Record {
    value.as_object().cloned().unwrap()
}

/// Record source serving canned records per (stream, context)
#[derive(Default)]
struct FixtureSource {
    records: HashMap<(String, PartitionContext), Vec<Record>>,
    calls: Mutex<Vec<(String, PartitionContext)>>,
}

impl FixtureSource {
    fn with(mut self, stream: &str, ctx: PartitionContext, records: Vec<Record>) -> Self {
        self.records.insert((stream.to_string(), ctx), records);
        self
    }

    fn calls(&self) -> Vec<(String, PartitionContext)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordSource for FixtureSource {
    async fn collect(&self, stream: &StreamSpec, ctx: &PartitionContext) -> Result<Vec<Record>> {
        self.calls
            .lock()
            .unwrap()
            .push((stream.name.clone(), ctx.clone()));
        Ok(self
            .records
            .get(&(stream.name.clone(), ctx.clone()))
            .cloned()
            .unwrap_or_default())
    }
}

// ============================================================================
// PartitionContext
// ============================================================================

#[test]
fn test_context_basics() {
    let ctx = PartitionContext::new()
        .with("ad_id", "X1")
        .with("ad_account_id", "A1");

    assert_eq!(ctx.get("ad_id"), Some("X1"));
    assert_eq!(ctx.get("missing"), None);
    assert!(!ctx.is_empty());
    assert!(PartitionContext::new().is_empty());

    let keys: Vec<&str> = ctx.iter().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["ad_account_id", "ad_id"]);
}

#[test]
fn test_context_display() {
    let ctx = PartitionContext::new().with("ad_account_id", "A1");
    assert_eq!(ctx.to_string(), "ad_account_id=A1");
    assert_eq!(PartitionContext::new().to_string(), "<global>");
}

#[test]
fn test_state_key_is_canonical() {
    let a = PartitionContext::new()
        .with("ad_id", "X1")
        .with("ad_account_id", "A1");
    let b: PartitionContext = vec![("ad_account_id", "A1"), ("ad_id", "X1")]
        .into_iter()
        .collect();

    assert_eq!(a.state_key(None), b.state_key(None));
    assert_eq!(a.state_key(None), r#"{"ad_account_id":"A1","ad_id":"X1"}"#);
}

#[test]
fn test_state_key_projection() {
    let ctx = PartitionContext::new()
        .with("ad_account_id", "A1")
        .with("ad_id", "X1")
        .with("ad_status", "ACTIVE");
    let keys = vec!["ad_account_id".to_string(), "ad_id".to_string()];

    assert_eq!(
        ctx.state_key(Some(&keys)),
        r#"{"ad_account_id":"A1","ad_id":"X1"}"#
    );
    assert_eq!(PartitionContext::new().state_key(None), "{}");
}

#[test]
fn test_context_serde_is_flat() {
    let ctx = PartitionContext::new().with("ad_account_id", "A1");
    assert_eq!(
        serde_json::to_value(&ctx).unwrap(),
        json!({"ad_account_id": "A1"})
    );
}

// ============================================================================
// Projection
// ============================================================================

#[test]
fn test_account_projection() {
    let stream = pinterest::ad_accounts();
    let ctx = stream
        .child_context
        .project(&stream.name, &record(json!({"id": "A1", "name": "Acme"})))
        .unwrap();

    assert_eq!(ctx, PartitionContext::new().with("ad_account_id", "A1"));
}

#[test]
fn test_ad_projection_carries_status() {
    let stream = pinterest::ads();
    let ctx = stream
        .child_context
        .project(
            &stream.name,
            &record(json!({"ad_account_id": "A1", "id": "X1", "status": "ACTIVE"})),
        )
        .unwrap();

    assert_eq!(
        ctx,
        PartitionContext::new()
            .with("ad_account_id", "A1")
            .with("ad_id", "X1")
            .with("ad_status", "ACTIVE")
    );
}

#[test]
fn test_optional_field_may_be_missing() {
    let stream = pinterest::ads();
    let ctx = stream
        .child_context
        .project(&stream.name, &record(json!({"ad_account_id": "A1", "id": "X1"})))
        .unwrap();

    assert_eq!(ctx.get("ad_status"), None);
    assert_eq!(ctx.get("ad_id"), Some("X1"));
}

#[test]
fn test_required_field_missing_is_error() {
    let stream = pinterest::ads();
    let err = stream
        .child_context
        .project(&stream.name, &record(json!({"id": "X1"})))
        .unwrap_err();

    match err {
        Error::MissingContextField { stream, field } => {
            assert_eq!(stream, "ads");
            assert_eq!(field, "ad_account_id");
        }
        other => panic!("expected MissingContextField, got {other:?}"),
    }
}

#[test]
fn test_numeric_and_nested_values() {
    let projection = ContextProjection::new(vec![
        ContextField::required("id", "id"),
        ContextField::required("owner", "owner.username"),
    ]);
    let ctx = projection
        .project(
            "ad_accounts",
            &record(json!({"id": 549755885175_u64, "owner": {"username": "acme"}})),
        )
        .unwrap();

    assert_eq!(ctx.get("id"), Some("549755885175"));
    assert_eq!(ctx.get("owner"), Some("acme"));
}

// ============================================================================
// Resolver
// ============================================================================

#[tokio::test]
async fn test_root_stream_has_single_global_partition() {
    let catalog = Catalog::pinterest();
    let source = FixtureSource::default();
    let resolver = PartitionResolver::new(&catalog, &source);

    let partitions = resolver
        .resolve(catalog.get("ad_accounts").unwrap())
        .await
        .unwrap();

    assert_eq!(partitions, vec![PartitionContext::new()]);
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn test_child_partitions_follow_parent_order() {
    let catalog = Catalog::pinterest();
    let source = FixtureSource::default().with(
        "ad_accounts",
        PartitionContext::new(),
        vec![
            record(json!({"id": "A2"})),
            record(json!({"id": "A1"})),
            record(json!({"id": "A2"})),
        ],
    );
    let resolver = PartitionResolver::new(&catalog, &source);

    let partitions = resolver
        .resolve(catalog.get("campaigns").unwrap())
        .await
        .unwrap();

    // no reordering, no deduplication
    assert_eq!(
        partitions,
        vec![
            PartitionContext::new().with("ad_account_id", "A2"),
            PartitionContext::new().with("ad_account_id", "A1"),
            PartitionContext::new().with("ad_account_id", "A2"),
        ]
    );
}

#[tokio::test]
async fn test_grandchild_replays_whole_chain() {
    let catalog = Catalog::pinterest();
    let account = PartitionContext::new().with("ad_account_id", "A1");
    let source = FixtureSource::default()
        .with(
            "ad_accounts",
            PartitionContext::new(),
            vec![record(json!({"id": "A1"}))],
        )
        .with(
            "ads",
            account.clone(),
            vec![
                record(json!({"ad_account_id": "A1", "id": "X1", "status": "ACTIVE"})),
                record(json!({"ad_account_id": "A1", "id": "X2", "status": "PAUSED"})),
            ],
        );
    let resolver = PartitionResolver::new(&catalog, &source);

    let partitions = resolver
        .resolve(catalog.get("ad_analytics").unwrap())
        .await
        .unwrap();

    assert_eq!(partitions.len(), 2);
    assert_eq!(
        partitions[0],
        PartitionContext::new()
            .with("ad_account_id", "A1")
            .with("ad_id", "X1")
            .with("ad_status", "ACTIVE")
    );
    assert_eq!(partitions[1].get("ad_status"), Some("PAUSED"));

    assert_eq!(
        source.calls(),
        vec![
            ("ad_accounts".to_string(), PartitionContext::new()),
            ("ads".to_string(), account),
        ]
    );
}

#[tokio::test]
async fn test_parent_without_records_yields_no_partitions() {
    let catalog = Catalog::pinterest();
    let source = FixtureSource::default();
    let resolver = PartitionResolver::new(&catalog, &source);

    let partitions = resolver
        .resolve(catalog.get("account_analytics").unwrap())
        .await
        .unwrap();
    assert!(partitions.is_empty());
}
