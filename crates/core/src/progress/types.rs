use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cache::CacheError;

/// Per-item acquisition progress, stored as one cache entry per item.
///
/// Every field defaults, so records written by older versions still decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemProgress {
    /// Where the fetched source file lives.
    #[serde(default)]
    pub source_path: Option<PathBuf>,
    /// The source file has been fully fetched.
    #[serde(default)]
    pub fetched: bool,
    /// The fetched file has been transformed into its final form.
    #[serde(default)]
    pub transformed: bool,
}

/// Errors surfaced by the progress tracker.
#[derive(Debug, Error)]
pub enum ProgressError {
    /// The underlying state cache failed.
    #[error("state cache error: {0}")]
    Cache(#[from] CacheError),

    /// The stored record does not decode as a progress record.
    #[error("progress record for '{item_id}' is malformed")]
    Malformed { item_id: String },

    /// A progress record could not be encoded for storage.
    #[error("failed to encode progress record: {0}")]
    Encode(#[from] serde_json::Error),
}
