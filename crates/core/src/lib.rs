pub mod cache;
pub mod config;
pub mod metrics;
pub mod pool;
pub mod progress;
pub mod testing;

pub use cache::{
    create_state_cache, CacheConfig, CacheError, CacheInstance, CacheRegistry, CacheWriter,
    FlushGuard, JsonFileStore, StateCache, StateDocument, StateStore, StoreError,
};
pub use config::{
    load_config, load_config_from_str, validate_config, ConfigError, CoreConfig,
};
pub use pool::{
    ArtifactTracker, JobCompleteCallback, JobError, JobReport, JobRunner, JobSpec, PoolConfig,
    PoolStatus, WorkerPool,
};
pub use progress::{ItemProgress, ProgressError, ProgressTracker};
