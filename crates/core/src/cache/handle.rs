use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::{timeout_at, Instant};

use crate::metrics;

use super::{
    CacheConfig, CacheError, PendingWrite, StateDocument, StateStore, StoreError, WriterCommand,
};

/// State shared between cache handles and the writer task.
pub(crate) struct CacheShared {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) entries: RwLock<StateDocument>,
    /// Writes accepted by a handle but not yet applied by the writer.
    pub(crate) queued_writes: AtomicUsize,
    /// Signalled by the writer each time the queue empties.
    pub(crate) drained: Notify,
    /// While set, the writer skips its debounced persists.
    pub(crate) persist_paused: AtomicBool,
    /// Cleared on stop; handles that outlive the instance fail soft.
    pub(crate) live: AtomicBool,
}

impl CacheShared {
    /// Persist the current document. Runs under the entries write lock so
    /// flushes and the writer's debounced persists never interleave.
    pub(crate) async fn persist(&self) -> Result<(), StoreError> {
        let entries = self.entries.write().await;
        let result = self.store.save(&self.path, &entries);
        match &result {
            Ok(()) => metrics::CACHE_PERSISTS.with_label_values(&["success"]).inc(),
            Err(_) => metrics::CACHE_PERSISTS.with_label_values(&["failed"]).inc(),
        }
        result
    }
}

/// Cloneable handle for reading and writing one named state cache.
///
/// Writes are queued for a background writer task and never block the caller.
/// Reads wait for queued writes to apply before serving, but only up to a
/// configured budget: the cache promises bounded staleness, not strict
/// freshness.
#[derive(Clone)]
pub struct StateCache {
    tx: mpsc::UnboundedSender<WriterCommand>,
    shared: Arc<CacheShared>,
    config: CacheConfig,
}

impl std::fmt::Debug for StateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCache")
            .field("name", &self.shared.name)
            .field("path", &self.shared.path)
            .finish()
    }
}

impl StateCache {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<WriterCommand>,
        shared: Arc<CacheShared>,
        config: CacheConfig,
    ) -> Self {
        Self { tx, shared, config }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    /// Queue a write for the given key.
    ///
    /// Never blocks and never fails. Writes sent to a stopped cache are
    /// dropped with a log line rather than surfaced to the caller.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if !self.shared.live.load(Ordering::SeqCst) {
            tracing::warn!(
                "State cache '{}' is stopped; dropping write for key '{}'",
                self.shared.name,
                key
            );
            return;
        }
        self.shared.queued_writes.fetch_add(1, Ordering::AcqRel);
        let command = WriterCommand::Write(PendingWrite { key, value });
        if self.tx.send(command).is_err() {
            self.shared.queued_writes.fetch_sub(1, Ordering::AcqRel);
            tracing::error!(
                "State cache '{}' writer is gone; write dropped",
                self.shared.name
            );
        }
    }

    /// Read the value stored under `key`.
    ///
    /// Waits up to the configured settle budget for queued writes to apply
    /// first. A queue that does not settle in time is served as-is, so a
    /// value read here can be at most one settle budget stale.
    pub async fn get(&self, key: &str) -> Result<Value, CacheError> {
        self.settle(Duration::from_millis(self.config.get_settle_budget_ms))
            .await;
        let entries = self.shared.entries.read().await;
        entries
            .get(key)
            .cloned()
            .ok_or_else(|| CacheError::key_not_found(&self.shared.name, key))
    }

    /// Snapshot of every key currently in the document.
    ///
    /// Does not wait for queued writes; keys written moments ago may be
    /// missing from the snapshot.
    pub async fn keys(&self) -> Vec<String> {
        self.shared.entries.read().await.keys().cloned().collect()
    }

    /// Wait for queued writes to settle, then persist the document.
    ///
    /// The wait is bounded by the flush settle budget; once it elapses the
    /// document is persisted as-is and writes still queued are picked up by
    /// a later persist. Debounced persists are paused for the duration so
    /// the flush does not race its own writer.
    pub async fn flush(&self) -> Result<(), CacheError> {
        if !self.shared.live.load(Ordering::SeqCst) {
            return Err(CacheError::stopped(&self.shared.name));
        }
        let started = Instant::now();
        self.shared.persist_paused.store(true, Ordering::SeqCst);
        let settled = self
            .settle(Duration::from_millis(self.config.flush_settle_budget_ms))
            .await;
        if !settled {
            tracing::warn!(
                "State cache '{}' still has {} queued write(s) after the flush budget; persisting anyway",
                self.shared.name,
                self.shared.queued_writes.load(Ordering::Acquire)
            );
        }
        let result = self.shared.persist().await;
        self.shared.persist_paused.store(false, Ordering::SeqCst);
        metrics::CACHE_FLUSH_DURATION.observe(started.elapsed().as_secs_f64());
        result.map_err(Into::into)
    }

    /// Returns a guard that queues one persist when dropped.
    ///
    /// The persist runs after every write queued before the drop has been
    /// applied, which makes the guard a cheap way to cover early returns and
    /// unwinds in a scope that mutates the cache.
    pub fn flush_on_exit(&self) -> FlushGuard {
        FlushGuard {
            tx: self.tx.clone(),
            name: self.shared.name.clone(),
        }
    }

    /// Wait until the write queue is empty or `budget` elapses. Returns
    /// whether the queue actually drained.
    async fn settle(&self, budget: Duration) -> bool {
        let deadline = Instant::now() + budget;
        loop {
            let drained = self.shared.drained.notified();
            if self.shared.queued_writes.load(Ordering::Acquire) == 0 {
                return true;
            }
            if timeout_at(deadline, drained).await.is_err() {
                return self.shared.queued_writes.load(Ordering::Acquire) == 0;
            }
        }
    }

    pub(crate) fn mark_stopped(&self) {
        self.shared.live.store(false, Ordering::SeqCst);
    }

    pub(crate) fn send_shutdown(&self) {
        if self.tx.send(WriterCommand::Shutdown).is_err() {
            tracing::debug!("State cache '{}' writer already gone", self.shared.name);
        }
    }

    pub(crate) async fn persist_now(&self) -> Result<(), StoreError> {
        self.shared.persist().await
    }
}

/// Queues one persist for its cache when dropped.
pub struct FlushGuard {
    tx: mpsc::UnboundedSender<WriterCommand>,
    name: String,
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        if self.tx.send(WriterCommand::Persist).is_err() {
            tracing::debug!(
                "State cache '{}' writer is gone; exit flush skipped",
                self.name
            );
        }
    }
}
