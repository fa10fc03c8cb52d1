use serde::{Deserialize, Serialize};

fn default_max_concurrency() -> usize {
    3
}

/// Tuning knobs for the worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Upper bound on jobs running at the same time. Queued jobs wait for a
    /// slot in submission order.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl PoolConfig {
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }
}
