use serde::{Deserialize, Serialize};

fn default_get_settle_budget_ms() -> u64 {
    1_000 // 1 second
}

fn default_flush_settle_budget_ms() -> u64 {
    500
}

fn default_persist_every() -> u32 {
    3
}

/// Tuning knobs shared by every cache instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a read waits for queued writes to apply before serving.
    #[serde(default = "default_get_settle_budget_ms")]
    pub get_settle_budget_ms: u64,

    /// How long a flush waits for queued writes to apply before persisting anyway.
    /// Kept shorter than the read budget so shutdown stays snappy.
    #[serde(default = "default_flush_settle_budget_ms")]
    pub flush_settle_budget_ms: u64,

    /// Persist the document once per this many applied writes.
    #[serde(default = "default_persist_every")]
    pub persist_every: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            get_settle_budget_ms: default_get_settle_budget_ms(),
            flush_settle_budget_ms: default_flush_settle_budget_ms(),
            persist_every: default_persist_every(),
        }
    }
}

impl CacheConfig {
    pub fn with_get_settle_budget_ms(mut self, budget_ms: u64) -> Self {
        self.get_settle_budget_ms = budget_ms;
        self
    }

    pub fn with_flush_settle_budget_ms(mut self, budget_ms: u64) -> Self {
        self.flush_settle_budget_ms = budget_ms;
        self
    }

    pub fn with_persist_every(mut self, persist_every: u32) -> Self {
        self.persist_every = persist_every;
        self
    }
}
