use std::path::Path;

use super::{StateDocument, StoreError};

/// Trait for whole-document state persistence.
///
/// A store reads and writes complete documents. Incremental updates are the
/// cache's job; by the time a store is called the document is already final.
pub trait StateStore: Send + Sync {
    /// Load the document at `path`, or an empty one when no file exists yet.
    ///
    /// A file that exists but cannot be parsed is a
    /// [`StoreError::CorruptState`], not an empty document.
    fn load(&self, path: &Path) -> Result<StateDocument, StoreError>;

    /// Persist the whole document to `path`, replacing any previous content.
    fn save(&self, path: &Path, document: &StateDocument) -> Result<(), StoreError>;
}
