//! Message sinks

use super::types::Message;
use crate::error::{Error, Result};
use crate::types::Record;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Destination for emitted messages
pub trait MessageSink: Send + Sync {
    /// Write one message
    fn emit(&self, message: &Message) -> Result<()>;
}

/// Writes messages as JSON lines to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl StdoutSink {
    pub fn new() -> Self {
        Self
    }
}

impl MessageSink for StdoutSink {
    fn emit(&self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message)?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

/// Collects messages in memory
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<Message>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages emitted so far
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Records emitted for one stream, in order
    pub fn records(&self, stream: &str) -> Vec<Record> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Number of state messages emitted
    pub fn state_count(&self) -> usize {
        self.messages().iter().filter(|m| m.is_state()).count()
    }

    /// Drop everything collected so far
    pub fn clear(&self) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.clear();
        }
    }
}

impl MessageSink for MemorySink {
    fn emit(&self, message: &Message) -> Result<()> {
        self.messages
            .lock()
            .map_err(|e| Error::Other(format!("Message buffer poisoned: {e}")))?
            .push(message.clone());
        Ok(())
    }
}
