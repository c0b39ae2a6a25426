//! Stream schemas
//!
//! JSON schemas derived from each stream's declared column set, used for
//! `SCHEMA` messages and `discover` output.

mod discover;
mod types;

pub use discover::{column_property, stream_schema, CatalogEntry, DiscoveredCatalog};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};

#[cfg(test)]
mod tests;
