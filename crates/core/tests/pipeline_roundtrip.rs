//! End-to-end tests wiring the cache registry, progress tracker and worker
//! pool together the way a fetch-and-transform pipeline does.
//!
//! Tests cover:
//! - Transform completions flowing back into the persisted progress cache
//! - A restarted pipeline resuming exactly the unfinished items

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;

use mediarc_core::cache::{CacheConfig, CacheRegistry, JsonFileStore, StateStore};
use mediarc_core::pool::{JobSpec, PoolConfig, WorkerPool};
use mediarc_core::progress::{ItemProgress, ProgressTracker};
use mediarc_core::testing::fixtures::fetched_progress;
use mediarc_core::testing::MockJobRunner;

// =============================================================================
// Test Harness
// =============================================================================

struct TestHarness {
    temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn progress_path(&self) -> PathBuf {
        self.temp_dir.path().join("progress.json")
    }

    /// Open a registry over the harness directory, as a fresh process would.
    async fn open_registry(&self) -> CacheRegistry {
        let registry = CacheRegistry::new(Arc::new(JsonFileStore::new()), CacheConfig::default());
        let caches: HashMap<String, PathBuf> =
            [("progress".to_string(), self.progress_path())].into();
        registry
            .register_all(&caches)
            .await
            .expect("Failed to register progress cache");
        registry
    }

    async fn tracker(&self, registry: &CacheRegistry) -> ProgressTracker {
        let cache = registry
            .get("progress")
            .await
            .expect("Failed to look up progress cache");
        ProgressTracker::new(cache)
    }
}

// =============================================================================
// Full Pipeline
// =============================================================================

#[tokio::test]
async fn test_transform_completions_reach_the_persisted_cache() {
    let harness = TestHarness::new();
    let registry = harness.open_registry().await;
    let tracker = harness.tracker(&registry).await;

    // Three items fetched by an upstream stage, which flushes before
    // handing off so the resume scan sees a settled document.
    let cache = registry.get("progress").await.unwrap();
    for item in ["item-a", "item-b", "item-c"] {
        cache.set(item, serde_json::to_value(fetched_progress(item)).unwrap());
    }
    cache.flush().await.unwrap();

    let pending = tracker.pending_transforms().await.unwrap();
    assert_eq!(pending.len(), 3);

    // Completion reports flow over a channel into the tracker, the same
    // shape a transform stage uses in production.
    let runner = Arc::new(MockJobRunner::new());
    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let pool = WorkerPool::new(
        PoolConfig::default().with_max_concurrency(2),
        Arc::clone(&runner),
    )
    .with_on_complete(move |report| {
        let _ = report_tx.send(report.clone());
    });

    let consumer_tracker = harness.tracker(&registry).await;
    let consumer = tokio::spawn(async move {
        while let Some(report) = report_rx.recv().await {
            consumer_tracker
                .record_transformed(&report.job_id)
                .await
                .expect("Failed to record transform");
        }
    });

    for (item_id, input_path) in pending {
        pool.submit(JobSpec::new(item_id, input_path));
    }
    pool.start().await;
    tokio::time::timeout(Duration::from_secs(5), pool.drain())
        .await
        .expect("drain timed out");
    pool.shutdown().await;

    // Dropping the pool drops the callback's channel end so the consumer
    // sees the close.
    drop(pool);
    consumer.await.unwrap();

    assert!(tracker.pending_transforms().await.unwrap().is_empty());
    registry.shutdown().await;

    // The document on disk reflects every completion.
    let document = JsonFileStore::new().load(&harness.progress_path()).unwrap();
    for item in ["item-a", "item-b", "item-c"] {
        let progress: ItemProgress = serde_json::from_value(document[item].clone()).unwrap();
        assert!(progress.fetched, "'{}' lost its fetched flag", item);
        assert!(progress.transformed, "'{}' was not transformed", item);
    }
}

#[tokio::test]
async fn test_restart_resumes_exactly_the_unfinished_items() {
    let harness = TestHarness::new();

    // First run: two items fetched, only one transformed before exit.
    {
        let registry = harness.open_registry().await;
        let tracker = harness.tracker(&registry).await;
        tracker
            .record_fetched("item-a", "/media/incoming/item-a.aax")
            .await
            .unwrap();
        tracker
            .record_fetched("item-b", "/media/incoming/item-b.aax")
            .await
            .unwrap();
        tracker.record_transformed("item-a").await.unwrap();
        registry.shutdown().await;
    }

    // Second run resumes item-b and nothing else.
    let registry = harness.open_registry().await;
    let tracker = harness.tracker(&registry).await;
    let pending = tracker.pending_transforms().await.unwrap();
    assert_eq!(
        pending,
        vec![(
            "item-b".to_string(),
            PathBuf::from("/media/incoming/item-b.aax")
        )]
    );

    tracker.record_transformed("item-b").await.unwrap();
    registry.shutdown().await;

    // Third run finds nothing left to do.
    let registry = harness.open_registry().await;
    let tracker = harness.tracker(&registry).await;
    assert!(tracker.pending_transforms().await.unwrap().is_empty());
    registry.shutdown().await;
}
