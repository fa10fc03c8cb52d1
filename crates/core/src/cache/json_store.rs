use std::fs;
use std::io;
use std::path::Path;

use super::{StateDocument, StateStore, StoreError};

/// [`StateStore`] backed by one pretty-printed JSON file per cache.
///
/// Saves rewrite the whole file in place. A crash mid-write can leave a
/// truncated file behind; the next load reports it as corrupt rather than
/// guessing at the content.
#[derive(Debug, Default, Clone)]
pub struct JsonFileStore;

impl JsonFileStore {
    pub fn new() -> Self {
        Self
    }
}

impl StateStore for JsonFileStore {
    fn load(&self, path: &Path) -> Result<StateDocument, StoreError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StateDocument::new()),
            Err(e) => return Err(StoreError::io(path, e)),
        };
        serde_json::from_str(&raw).map_err(|e| StoreError::corrupt(path, e))
    }

    fn save(&self, path: &Path, document: &StateDocument) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            }
        }
        let encoded = serde_json::to_string_pretty(document)?;
        fs::write(path, encoded).map_err(|e| StoreError::io(path, e))
    }
}
