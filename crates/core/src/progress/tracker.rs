use std::path::PathBuf;

use crate::cache::{CacheError, StateCache};

use super::{ItemProgress, ProgressError};

/// Typed view over one state cache holding per-item progress records.
///
/// Updates are read-modify-write: the current record is read (settling the
/// cache first), mutated and queued back. Writes are last-write-wins, so
/// each item should have a single component updating it at a time.
pub struct ProgressTracker {
    cache: StateCache,
}

impl ProgressTracker {
    pub fn new(cache: StateCache) -> Self {
        Self { cache }
    }

    /// Decode the record for one item.
    pub async fn get(&self, item_id: &str) -> Result<ItemProgress, ProgressError> {
        let value = self.cache.get(item_id).await?;
        serde_json::from_value(value).map_err(|_| ProgressError::Malformed {
            item_id: item_id.to_string(),
        })
    }

    /// Record that an item's source file has been fully fetched.
    ///
    /// Creates the record when the item is new. A malformed record is
    /// overwritten rather than kept around forever.
    pub async fn record_fetched(
        &self,
        item_id: &str,
        source_path: impl Into<PathBuf>,
    ) -> Result<(), ProgressError> {
        let mut progress = match self.get(item_id).await {
            Ok(progress) => progress,
            Err(ProgressError::Cache(CacheError::KeyNotFound { .. })) => ItemProgress::default(),
            Err(ProgressError::Malformed { .. }) => {
                tracing::warn!("Overwriting malformed progress record for '{}'", item_id);
                ItemProgress::default()
            }
            Err(e) => return Err(e),
        };
        progress.source_path = Some(source_path.into());
        progress.fetched = true;
        self.put(item_id, &progress)
    }

    /// Record that an item's fetched file has been transformed.
    ///
    /// The item must already have a record; a transform completing for an
    /// unknown item is a wiring bug worth surfacing.
    pub async fn record_transformed(&self, item_id: &str) -> Result<(), ProgressError> {
        let mut progress = self.get(item_id).await?;
        progress.transformed = true;
        self.put(item_id, &progress)
    }

    /// Items fetched but not yet transformed, with their source paths.
    pub async fn pending_transforms(&self) -> Result<Vec<(String, PathBuf)>, ProgressError> {
        let mut pending = Vec::new();
        for item_id in self.cache.keys().await {
            match self.get(&item_id).await {
                Ok(progress) => {
                    if progress.fetched && !progress.transformed {
                        if let Some(path) = progress.source_path {
                            pending.push((item_id, path));
                        } else {
                            tracing::warn!("Item '{}' is fetched but has no source path", item_id);
                        }
                    }
                }
                Err(ProgressError::Malformed { .. }) => {
                    tracing::warn!("Skipping malformed progress record for '{}'", item_id);
                }
                Err(e) => return Err(e),
            }
        }
        // Deterministic resume order.
        pending.sort();
        Ok(pending)
    }

    fn put(&self, item_id: &str, progress: &ItemProgress) -> Result<(), ProgressError> {
        let value = serde_json::to_value(progress)?;
        self.cache.set(item_id, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{create_state_cache, CacheConfig};
    use crate::testing::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    fn tracker_with_cache() -> (ProgressTracker, StateCache) {
        let (cache, writer) = create_state_cache(
            "progress",
            "progress.json",
            Arc::new(MemoryStore::new()),
            CacheConfig::default(),
        )
        .unwrap();
        tokio::spawn(writer.run());
        (ProgressTracker::new(cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_record_fetched_creates_record() {
        let (tracker, _cache) = tracker_with_cache();

        tracker
            .record_fetched("item-1", "/media/incoming/item-1.aax")
            .await
            .unwrap();

        let progress = tracker.get("item-1").await.unwrap();
        assert!(progress.fetched);
        assert!(!progress.transformed);
        assert_eq!(
            progress.source_path,
            Some(PathBuf::from("/media/incoming/item-1.aax"))
        );
    }

    #[tokio::test]
    async fn test_record_transformed_requires_existing_record() {
        let (tracker, _cache) = tracker_with_cache();

        let err = tracker.record_transformed("unknown").await.unwrap_err();

        assert!(matches!(
            err,
            ProgressError::Cache(CacheError::KeyNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_then_transform_round_trip() {
        let (tracker, _cache) = tracker_with_cache();

        tracker
            .record_fetched("item-1", "/media/incoming/item-1.aax")
            .await
            .unwrap();
        tracker.record_transformed("item-1").await.unwrap();

        let progress = tracker.get("item-1").await.unwrap();
        assert!(progress.fetched);
        assert!(progress.transformed);
    }

    #[tokio::test]
    async fn test_pending_transforms_lists_unfinished_items() {
        let (tracker, cache) = tracker_with_cache();

        tracker.record_fetched("item-a", "/media/a.aax").await.unwrap();
        tracker.record_fetched("item-b", "/media/b.aax").await.unwrap();
        tracker.record_transformed("item-b").await.unwrap();
        // A record something else wrote; must not derail the scan.
        cache.set("weird", json!(42));

        let pending = tracker.pending_transforms().await.unwrap();

        assert_eq!(
            pending,
            vec![("item-a".to_string(), PathBuf::from("/media/a.aax"))]
        );
    }

    #[tokio::test]
    async fn test_malformed_record_is_overwritten_on_fetch() {
        let (tracker, cache) = tracker_with_cache();

        cache.set("item-1", json!("not a record"));
        tracker
            .record_fetched("item-1", "/media/incoming/item-1.aax")
            .await
            .unwrap();

        let progress = tracker.get("item-1").await.unwrap();
        assert!(progress.fetched);
    }
}
