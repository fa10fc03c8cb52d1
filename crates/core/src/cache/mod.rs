//! Write-behind persisted state caches.
//!
//! Each cache pairs an in-memory JSON document with a background writer
//! task. Handles queue writes without ever blocking; the writer applies them
//! in order and persists the document on a debounced cadence. Reads wait for
//! queued writes to apply, but only up to a bounded budget, trading strict
//! freshness for non-blocking writers.
//!
//! ```rust,ignore
//! let registry = CacheRegistry::new(Arc::new(JsonFileStore::new()), CacheConfig::default());
//! registry.register_all(&caches).await?;
//!
//! let downloads = registry.get("downloads").await?;
//! downloads.set("item-1", json!({"fetched": true}));
//! let progress = downloads.get("item-1").await?;
//!
//! registry.shutdown().await;
//! ```

mod config;
mod error;
mod handle;
mod json_store;
mod registry;
mod store;
mod types;
mod writer;

pub use config::*;
pub use error::*;
pub use handle::*;
pub use json_store::*;
pub use registry::*;
pub use store::*;
pub use types::*;
pub use writer::*;
