//! JSONPath extraction of records and cursors

use crate::error::{Error, Result};
use crate::types::Record;
use reqwest::header::HeaderMap;
use serde_json::Value;

/// Evaluate a JSONPath and return every match
pub fn find_all(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    match jp.find(value) {
        Value::Array(arr) => Ok(arr),
        Value::Null => Ok(vec![]),
        other => Ok(vec![other]),
    }
}

/// Extract the records a path points at
///
/// For a wildcard path like `$.items[*]` the container (`$.items`) must be
/// present and be an array; an empty array is a valid empty page. Every
/// record must be a JSON object.
pub fn extract_records(body: &Value, path: &str) -> Result<Vec<Record>> {
    if let Some(container) = path.strip_suffix("[*]") {
        let found = find_all(body, container)?;
        match found.first() {
            Some(Value::Array(_)) => {}
            Some(other) => {
                return Err(Error::extraction(
                    path,
                    format!("expected an array, found {}", type_name(other)),
                ))
            }
            None => return Err(Error::extraction(path, "path not found in response")),
        }
    }

    find_all(body, path)?
        .into_iter()
        .map(|value| match value {
            Value::Object(record) => Ok(record),
            other => Err(Error::extraction(
                path,
                format!("expected an object record, found {}", type_name(&other)),
            )),
        })
        .collect()
}

/// Extract a continuation token from the body, falling back to a header
///
/// Null, empty and missing tokens all mean there is no next page.
pub fn extract_token(
    body: &Value,
    path: &str,
    headers: &HeaderMap,
    header_fallback: Option<&str>,
) -> Result<Option<String>> {
    let from_body = find_all(body, path)?
        .into_iter()
        .next()
        .and_then(|value| match value {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty());

    if from_body.is_some() {
        return Ok(from_body);
    }

    Ok(header_fallback
        .and_then(|name| headers.get(name))
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .filter(|s| !s.is_empty()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
