//! Engine tuning knobs.

use serde::Deserialize;

/// Default number of extra attempts after a lost compare-and-swap.
pub const DEFAULT_MAX_RETRIES: u32 = 8;

/// Default broadcast buffer for workflow events.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Retries of the per-key atomic step before reporting a transient failure.
    pub max_retries: u32,
    /// Events a slow subscriber may lag behind before it starts missing some.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Zero is bumped to one; `tokio::sync::broadcast` rejects empty buffers.
    pub fn with_event_capacity(mut self, n: usize) -> Self {
        self.event_capacity = n.max(1);
        self
    }
}
