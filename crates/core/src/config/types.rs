use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::pool::PoolConfig;

/// Top-level configuration for the acquisition core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Named state caches and the JSON files backing them.
    #[serde(default)]
    pub caches: HashMap<String, PathBuf>,

    /// Worker pool tuning.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Cache tuning, shared by every instance.
    #[serde(default)]
    pub cache: CacheConfig,
}
