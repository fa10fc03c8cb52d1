use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Notify, RwLock};

use crate::metrics;

use super::handle::CacheShared;
use super::{CacheConfig, CacheError, StateCache, StateStore, WriterCommand};

/// Background task owning the apply side of one state cache.
///
/// Commands queued by handles are applied strictly in order, so the last
/// write for a key always wins. The document is persisted once per
/// `persist_every` applied writes, unless a flush currently has persistence
/// paused.
pub struct CacheWriter {
    rx: mpsc::UnboundedReceiver<WriterCommand>,
    shared: Arc<CacheShared>,
    persist_every: u32,
}

impl CacheWriter {
    /// Consume commands until a shutdown command arrives or every handle has
    /// been dropped.
    pub async fn run(mut self) {
        tracing::info!("State cache writer started for '{}'", self.shared.name);

        let mut applied_since_persist: u32 = 0;
        while let Some(command) = self.rx.recv().await {
            match command {
                WriterCommand::Write(write) => {
                    {
                        let mut entries = self.shared.entries.write().await;
                        entries.insert(write.key, write.value);
                    }
                    metrics::CACHE_WRITES_APPLIED.inc();
                    if self.shared.queued_writes.fetch_sub(1, Ordering::AcqRel) == 1 {
                        self.shared.drained.notify_waiters();
                    }

                    applied_since_persist = (applied_since_persist + 1) % self.persist_every;
                    if applied_since_persist == 0
                        && !self.shared.persist_paused.load(Ordering::SeqCst)
                    {
                        if let Err(e) = self.shared.persist().await {
                            tracing::error!(
                                "State cache '{}' periodic persist failed, state kept in memory: {}",
                                self.shared.name,
                                e
                            );
                        }
                    }
                }
                WriterCommand::Persist => {
                    if let Err(e) = self.shared.persist().await {
                        tracing::error!(
                            "State cache '{}' requested persist failed: {}",
                            self.shared.name,
                            e
                        );
                    }
                }
                WriterCommand::Shutdown => break,
            }
        }

        tracing::info!(
            "State cache writer for '{}' shutting down",
            self.shared.name
        );
    }
}

/// Create a connected handle and writer for one persisted state cache.
///
/// The document is loaded eagerly: a missing file starts the cache empty,
/// while an unreadable one fails creation so startup can abort instead of
/// shadowing real state with an empty document. The writer does nothing
/// until spawned:
///
/// ```rust,ignore
/// let (cache, writer) = create_state_cache("downloads", path, store, config)?;
/// tokio::spawn(writer.run());
/// cache.set("item-1", serde_json::json!({"fetched": true}));
/// ```
pub fn create_state_cache(
    name: impl Into<String>,
    path: impl Into<PathBuf>,
    store: Arc<dyn StateStore>,
    config: CacheConfig,
) -> Result<(StateCache, CacheWriter), CacheError> {
    let name = name.into();
    let path = path.into();

    let entries = store.load(&path)?;
    tracing::debug!(
        "State cache '{}' loaded {} entries from {}",
        name,
        entries.len(),
        path.display()
    );

    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(CacheShared {
        name,
        path,
        store,
        entries: RwLock::new(entries),
        queued_writes: AtomicUsize::new(0),
        drained: Notify::new(),
        persist_paused: AtomicBool::new(false),
        live: AtomicBool::new(true),
    });

    let persist_every = config.persist_every.max(1);
    let cache = StateCache::new(tx, Arc::clone(&shared), config);
    let writer = CacheWriter {
        rx,
        shared,
        persist_every,
    };
    Ok((cache, writer))
}
