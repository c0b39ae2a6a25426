//! Tests for the pagination module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig, RetryPolicy};
use crate::partition::PartitionContext;
use crate::streams::{pinterest, StreamSpec};
use crate::types::Record;
use chrono::NaiveDate;
use futures::TryStreamExt;
use pretty_assertions::assert_eq;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn client(server: &MockServer) -> HttpClient {
    let config = HttpClientConfig::builder()
        .base_url(server.uri())
        .retry(RetryPolicy::new(2, Duration::from_millis(1)))
        .build();
    HttpClient::with_config(config).unwrap()
}

fn ids(records: &[Record]) -> Vec<&str> {
    records
        .iter()
        .map(|r| r.get("id").and_then(|v| v.as_str()).unwrap_or_default())
        .collect()
}

// ============================================================================
// Extraction
// ============================================================================

#[test]
fn test_extract_records_from_items() {
    let body = json!({"items": [{"id": "1"}, {"id": "2"}], "bookmark": "abc"});
    let records = extract_records(&body, "$.items[*]").unwrap();
    assert_eq!(ids(&records), vec!["1", "2"]);
}

#[test]
fn test_extract_records_from_bare_array() {
    let body = json!([{"AD_ID": "X1", "DATE": "2023-01-01"}]);
    let records = extract_records(&body, "$[*]").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["AD_ID"], "X1");
}

#[test]
fn test_empty_list_is_valid() {
    let records = extract_records(&json!({"items": []}), "$.items[*]").unwrap();
    assert!(records.is_empty());
    let records = extract_records(&json!([]), "$[*]").unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_missing_container_is_data_shape_error() {
    let err = extract_records(&json!({"data": []}), "$.items[*]").unwrap_err();
    assert!(matches!(err, Error::RecordExtraction { .. }));

    let err = extract_records(&json!({"items": "nope"}), "$.items[*]").unwrap_err();
    assert!(err.to_string().contains("expected an array"));
}

#[test]
fn test_non_object_record_is_error() {
    let err = extract_records(&json!({"items": [1, 2]}), "$.items[*]").unwrap_err();
    assert!(matches!(err, Error::RecordExtraction { .. }));
}

#[test]
fn test_invalid_jsonpath() {
    let err = find_all(&json!({}), "$[?(").unwrap_err();
    assert!(matches!(err, Error::JsonPath { .. }));
}

#[test]
fn test_extract_token() {
    let headers = HeaderMap::new();
    assert_eq!(
        extract_token(&json!({"bookmark": "abc"}), "$.bookmark", &headers, None).unwrap(),
        Some("abc".to_string())
    );
    assert_eq!(
        extract_token(&json!({"bookmark": null}), "$.bookmark", &headers, None).unwrap(),
        None
    );
    assert_eq!(
        extract_token(&json!({"bookmark": ""}), "$.bookmark", &headers, None).unwrap(),
        None
    );
    assert_eq!(
        extract_token(&json!({"items": []}), "$.bookmark", &headers, None).unwrap(),
        None
    );
}

#[test]
fn test_extract_token_header_fallback() {
    let mut headers = HeaderMap::new();
    headers.insert("X-Next-Page", HeaderValue::from_static("from-header"));

    let token = extract_token(
        &json!({"items": []}),
        "$.bookmark",
        &headers,
        Some("X-Next-Page"),
    )
    .unwrap();
    assert_eq!(token, Some("from-header".to_string()));

    let token = extract_token(
        &json!({"bookmark": "from-body"}),
        "$.bookmark",
        &headers,
        Some("X-Next-Page"),
    )
    .unwrap();
    assert_eq!(token, Some("from-body".to_string()));
}

#[test]
fn test_cursor_display() {
    assert_eq!(Cursor::Bookmark("abc".into()).to_string(), "abc");
    assert_eq!(
        Cursor::WindowStart(date("2023-01-01")).to_string(),
        "2023-01-01"
    );
}

// ============================================================================
// Page iteration
// ============================================================================

#[tokio::test]
async fn test_iterates_until_cursor_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ad_accounts"))
        .and(query_param("page_size", "100"))
        .and(query_param_is_missing("bookmark"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "1"}, {"id": "2"}],
            "bookmark": "page2"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ad_accounts"))
        .and(query_param("bookmark", "page2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "3"}],
            "bookmark": "page3"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ad_accounts"))
        .and(query_param("bookmark", "page3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "4"}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let stream = pinterest::ad_accounts();
    let ctx = PartitionContext::new();

    let records: Vec<Record> = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .records()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(ids(&records), vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn test_pages_report_cursor_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param_is_missing("bookmark"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"items": [], "bookmark": "b2"})),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("bookmark", "b2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let stream = pinterest::ad_accounts();
    let ctx = PartitionContext::new();

    let pages: Vec<Page> = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .pages()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].cursor, None);
    assert_eq!(pages[0].next, Some(Cursor::Bookmark("b2".into())));
    assert_eq!(pages[1].cursor, Some(Cursor::Bookmark("b2".into())));
    assert_eq!(pages[1].next, None);
}

#[tokio::test]
async fn test_path_placeholders_filled_from_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ad_accounts/A1/campaigns"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [{"id": "C1"}]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let stream = pinterest::campaigns();
    let ctx = PartitionContext::new().with("ad_account_id", "A1");

    let records: Vec<Record> = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .records()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(ids(&records), vec!["C1"]);
}

#[tokio::test]
async fn test_stalled_cursor_fails_fast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"items": [{"id": "1"}], "bookmark": "same"})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let stream = pinterest::ad_accounts();
    let ctx = PartitionContext::new();

    let err = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .records()
        .try_collect::<Vec<Record>>()
        .await
        .unwrap_err();

    match err {
        Error::StalledPagination { stream, cursor } => {
            assert_eq!(stream, "ad_accounts");
            assert_eq!(cursor, "same");
        }
        other => panic!("expected StalledPagination, got {other:?}"),
    }
}

#[tokio::test]
async fn test_max_pages_cap() {
    let mock_server = MockServer::start().await;

    for n in 0..5 {
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"items": [{"id": n.to_string()}], "bookmark": format!("b{}", n + 1)}),
            ))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;
    }

    let client = client(&mock_server);
    let stream = pinterest::ad_accounts();
    let ctx = PartitionContext::new();

    let err = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .max_pages(Some(3))
        .records()
        .try_collect::<Vec<Record>>()
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StalledPagination { .. }));
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_date_window_pagination() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ad_accounts/A1/ads/analytics"))
        .and(query_param("ad_ids", "X1"))
        .and(query_param("start_date", "2023-01-01"))
        .and(query_param("end_date", "2023-04-11"))
        .and(query_param("granularity", "DAY"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"AD_ID": "X1", "DATE": "2023-01-01"}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ad_accounts/A1/ads/analytics"))
        .and(query_param("start_date", "2023-04-12"))
        .and(query_param("end_date", "2023-05-31"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"AD_ID": "X1", "DATE": "2023-05-31"}])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let stream = pinterest::ad_analytics();
    let ctx = PartitionContext::new()
        .with("ad_account_id", "A1")
        .with("ad_id", "X1")
        .with("ad_status", "ACTIVE");

    let pages: Vec<Page> = PageIterator::new(&client, &stream, &ctx, date("2023-05-31"))
        .starting_at(Some(Cursor::WindowStart(date("2023-01-01"))))
        .pages()
        .try_collect()
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].next, Some(Cursor::WindowStart(date("2023-04-12"))));
    assert_eq!(pages[1].next, None);
    assert_eq!(pages[1].window.unwrap().end, date("2023-05-31"));
}

#[tokio::test]
async fn test_date_window_without_start_makes_no_calls() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let stream = pinterest::ad_analytics();
    let ctx = PartitionContext::new();

    let pages: Vec<Page> = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .pages()
        .try_collect()
        .await
        .unwrap();
    assert!(pages.is_empty());

    let pages: Vec<Page> = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .starting_at(Some(Cursor::WindowStart(date("2023-01-20"))))
        .pages()
        .try_collect()
        .await
        .unwrap();
    assert!(pages.is_empty());
}

#[tokio::test]
async fn test_custom_page_size() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(query_param("page_size", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server);
    let stream = StreamSpec::new("things", "things");
    let ctx = PartitionContext::new();

    let records: Vec<Record> = PageIterator::new(&client, &stream, &ctx, date("2023-01-19"))
        .page_size(25)
        .records()
        .try_collect()
        .await
        .unwrap();
    assert!(records.is_empty());
}
