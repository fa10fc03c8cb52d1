//! Testing utilities and mock implementations.
//!
//! This module provides a mock job runner and an in-memory state store,
//! allowing cache and pool behavior to be tested without real media files
//! or disk I/O.
//!
//! # Example
//!
//! ```rust,ignore
//! use mediarc_core::testing::{MemoryStore, MockJobRunner};
//!
//! let store = MemoryStore::new();
//! let runner = MockJobRunner::new();
//!
//! // Configure mock behavior
//! runner.set_job_duration(Duration::from_millis(200)).await;
//! runner.set_next_error(JobError::failed("item-1", "no audio stream")).await;
//!
//! // Use with CacheRegistry / WorkerPool...
//! ```

mod memory_store;
mod mock_runner;

pub use memory_store::MemoryStore;
pub use mock_runner::{MockJobRunner, RecordedJob};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::pool::JobSpec;
    use crate::progress::ItemProgress;
    use std::path::PathBuf;

    /// Create a job spec with the conventional incoming path for an item.
    pub fn job_spec(job_id: &str) -> JobSpec {
        JobSpec::new(job_id, format!("/media/incoming/{}.aax", job_id))
    }

    /// Create a progress record for an item fetched to the conventional path.
    pub fn fetched_progress(item_id: &str) -> ItemProgress {
        ItemProgress {
            source_path: Some(PathBuf::from(format!("/media/incoming/{}.aax", item_id))),
            fetched: true,
            transformed: false,
        }
    }
}
