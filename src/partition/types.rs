//! Partition types
//!
//! A partition is one scoped extraction unit, identified by a small map of
//! scalar values taken from a parent record.

use crate::error::{Error, Result};
use crate::types::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key/value scope of a single partition
///
/// Keys are kept sorted so the derived state key is canonical.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionContext {
    values: BTreeMap<String, String>,
}

impl PartitionContext {
    /// Create an empty (global) context
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value in place
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Whether this is the global context of a root stream
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over key/value pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Restrict the context to the given keys
    ///
    /// `None` keeps every key.
    pub fn project(&self, keys: Option<&[String]>) -> PartitionContext {
        match keys {
            None => self.clone(),
            Some(keys) => PartitionContext {
                values: self
                    .values
                    .iter()
                    .filter(|(k, _)| keys.iter().any(|key| key == *k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            },
        }
    }

    /// Canonical string identifying this partition in persisted state
    pub fn state_key(&self, keys: Option<&[String]>) -> String {
        let projected = self.project(keys);
        serde_json::to_string(&projected.values).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PartitionContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl std::fmt::Display for PartitionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.values.is_empty() {
            return f.write_str("<global>");
        }
        let pairs: Vec<String> = self.iter().map(|(k, v)| format!("{k}={v}")).collect();
        f.write_str(&pairs.join(","))
    }
}

/// One field of a record-to-context projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextField {
    /// Key in the child context
    pub key: String,
    /// Dotted path of the value in the parent record
    pub source: String,
    /// Whether a missing value is a data-shape error
    pub required: bool,
}

impl ContextField {
    /// A field that must be present in every parent record
    pub fn required(key: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            required: true,
        }
    }

    /// A field copied only when present
    pub fn optional(key: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: source.into(),
            required: false,
        }
    }
}

/// Record-to-context projection a parent stream exposes to its children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextProjection {
    /// Fields copied into the child context
    pub fields: Vec<ContextField>,
}

impl ContextProjection {
    /// Create a projection from fields
    pub fn new(fields: Vec<ContextField>) -> Self {
        Self { fields }
    }

    /// Whether the projection exposes anything
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Project a parent record into a child context
    pub fn project(&self, stream: &str, record: &Record) -> Result<PartitionContext> {
        let mut ctx = PartitionContext::new();

        for field in &self.fields {
            match lookup_scalar(record, &field.source) {
                Some(value) => ctx.insert(field.key.clone(), value),
                None if field.required => {
                    return Err(Error::MissingContextField {
                        stream: stream.to_string(),
                        field: field.source.clone(),
                    });
                }
                None => {}
            }
        }

        Ok(ctx)
    }
}

/// Look up a dotted path in a record and render it as a scalar string
fn lookup_scalar(record: &Record, path: &str) -> Option<String> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;

    for part in parts {
        current = current.get(part)?;
    }

    match current {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
