//! Output module
//!
//! Serializes schemas, records and state as JSON lines.
//!
//! # Overview
//!
//! - `Message` - `SCHEMA`, `RECORD` and `STATE` messages
//! - `MessageSink` - where messages go (`StdoutSink`, `MemorySink`)

mod sink;
mod types;

pub use sink::{MemorySink, MessageSink, StdoutSink};
pub use types::Message;
