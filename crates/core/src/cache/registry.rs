use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::{create_state_cache, CacheConfig, CacheError, StateCache, StateStore};

/// One started cache: the handle plus the writer task backing it.
pub struct CacheInstance {
    cache: StateCache,
    writer_task: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl CacheInstance {
    /// Load the cache document and spawn its writer task.
    pub fn start(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        store: Arc<dyn StateStore>,
        config: CacheConfig,
    ) -> Result<Self, CacheError> {
        let (cache, writer) = create_state_cache(name, path, store, config)?;
        let writer_task = tokio::spawn(writer.run());
        Ok(Self {
            cache,
            writer_task: Mutex::new(Some(writer_task)),
            stopped: AtomicBool::new(false),
        })
    }

    /// Cheap cloneable handle to this cache.
    pub fn handle(&self) -> StateCache {
        self.cache.clone()
    }

    /// Flush, stop the writer task and persist one final time.
    ///
    /// Stopping twice is a no-op. Writes racing in while the stop runs are
    /// dropped with a log line, matching the handle's fail-soft contract.
    pub async fn stop(&self) -> Result<(), CacheError> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            tracing::debug!("State cache '{}' already stopped", self.cache.name());
            return Ok(());
        }
        tracing::info!("Stopping state cache '{}'", self.cache.name());

        let flush_result = self.cache.flush().await;
        self.cache.mark_stopped();
        self.cache.send_shutdown();
        if let Some(task) = self.writer_task.lock().await.take() {
            if let Err(e) = task.await {
                tracing::error!(
                    "State cache '{}' writer task failed: {}",
                    self.cache.name(),
                    e
                );
            }
        }
        // Catches writes the writer applied after the flush snapshot.
        self.cache.persist_now().await?;
        flush_result
    }
}

/// Owns every named state cache in the process.
///
/// Caches are registered in bulk at startup and shut down in bulk at exit.
/// Components in between look their cache up by name and keep the returned
/// handle.
pub struct CacheRegistry {
    store: Arc<dyn StateStore>,
    config: CacheConfig,
    instances: RwLock<HashMap<String, CacheInstance>>,
    shut_down: AtomicBool,
}

impl CacheRegistry {
    pub fn new(store: Arc<dyn StateStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            instances: RwLock::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Start one cache per `(name, path)` entry.
    ///
    /// Name collisions with already registered caches are rejected before
    /// anything starts; a later call with fresh names adds to the registry.
    /// If a document fails to load the error propagates and caches started
    /// earlier in the call stay registered, so callers aborting startup
    /// should still shut the registry down.
    pub async fn register_all(&self, caches: &HashMap<String, PathBuf>) -> Result<(), CacheError> {
        let mut instances = self.instances.write().await;
        for name in caches.keys() {
            if instances.contains_key(name) {
                return Err(CacheError::AlreadyRegistered { name: name.clone() });
            }
        }

        for (name, path) in caches {
            let instance = CacheInstance::start(
                name.clone(),
                path.clone(),
                Arc::clone(&self.store),
                self.config.clone(),
            )?;
            instances.insert(name.clone(), instance);
        }
        tracing::info!("Registered {} state cache(s)", caches.len());
        Ok(())
    }

    /// Look up a handle by name.
    ///
    /// Distinguishes "nothing has been registered yet" from "unknown name"
    /// so wiring mistakes fail with the right message. The registry counts
    /// as uninitialized until at least one cache exists, so an empty bulk
    /// registration does not change the answer.
    pub async fn get(&self, name: &str) -> Result<StateCache, CacheError> {
        let instances = self.instances.read().await;
        if let Some(instance) = instances.get(name) {
            return Ok(instance.handle());
        }
        if instances.is_empty() {
            Err(CacheError::RegistryUninitialized)
        } else {
            Err(CacheError::UnregisteredCache {
                name: name.to_string(),
            })
        }
    }

    /// Names of every registered cache, in no particular order.
    pub async fn names(&self) -> Vec<String> {
        self.instances.read().await.keys().cloned().collect()
    }

    /// Stop every registered cache: flush, join the writers and persist the
    /// final documents.
    ///
    /// Per-cache failures are logged and do not stop the sweep. Calling this
    /// twice is a no-op.
    pub async fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("State cache registry already shut down");
            return;
        }
        tracing::info!("Shutting down state cache registry");
        let instances = self.instances.read().await;
        for (name, instance) in instances.iter() {
            if let Err(e) = instance.stop().await {
                tracing::error!("Failed to stop state cache '{}': {}", name, e);
            }
        }
        tracing::info!("State cache registry shut down");
    }
}
