use std::collections::HashMap;

use serde_json::Value;

/// In-memory form of one cache's persisted JSON document.
pub type StateDocument = HashMap<String, Value>;

/// A single key/value write queued for the cache writer.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub key: String,
    pub value: Value,
}

/// Commands consumed by the cache writer task.
#[derive(Debug)]
pub(crate) enum WriterCommand {
    /// Apply one write to the in-memory document.
    Write(PendingWrite),
    /// Persist the document after every command queued before this one has applied.
    Persist,
    /// Stop the writer loop.
    Shutdown,
}
