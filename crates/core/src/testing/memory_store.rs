use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::{StateDocument, StateStore, StoreError};

/// In-memory [`StateStore`] for tests.
///
/// Documents are keyed by path exactly like files on disk would be. Clones
/// share state, so a test can keep one handle for assertions while the code
/// under test owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<HashMap<PathBuf, StateDocument>>>,
    save_count: Arc<AtomicUsize>,
    next_save_error: Arc<Mutex<Option<String>>>,
    next_load_error: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the document last saved under `path`.
    pub fn document(&self, path: &Path) -> Option<StateDocument> {
        self.documents.lock().unwrap().get(path).cloned()
    }

    /// Successful saves across all paths.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Seed a document as if it had been saved earlier.
    pub fn put_document(&self, path: impl Into<PathBuf>, document: StateDocument) {
        self.documents.lock().unwrap().insert(path.into(), document);
    }

    /// Fail the next save with an I/O error carrying this message.
    pub fn set_next_save_error(&self, message: impl Into<String>) {
        *self.next_save_error.lock().unwrap() = Some(message.into());
    }

    /// Fail the next load with an I/O error carrying this message.
    pub fn set_next_load_error(&self, message: impl Into<String>) {
        *self.next_load_error.lock().unwrap() = Some(message.into());
    }
}

impl StateStore for MemoryStore {
    fn load(&self, path: &Path) -> Result<StateDocument, StoreError> {
        if let Some(message) = self.next_load_error.lock().unwrap().take() {
            return Err(StoreError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, message),
            ));
        }
        Ok(self.document(path).unwrap_or_default())
    }

    fn save(&self, path: &Path, document: &StateDocument) -> Result<(), StoreError> {
        if let Some(message) = self.next_save_error.lock().unwrap().take() {
            return Err(StoreError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, message),
            ));
        }
        self.documents
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), document.clone());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
