use std::time::Duration;

/// Tunables for a `MemoryCore` instance (MEMORY_* options).
#[derive(Clone, Debug)]
pub struct MemoryCoreConfig {
    /// Per-user upper bound on Memory rows (`MEMORY_MAX_MEMORIES`).
    pub max_memories: i64,
    /// Informational only — not a filter cutoff.
    pub similarity_threshold: f32,
    /// Deadline for a single database operation, decoupled from the
    /// inbound request.
    pub db_deadline: Duration,
}

impl Default for MemoryCoreConfig {
    fn default() -> Self {
        Self {
            max_memories: 1000,
            similarity_threshold: 0.3,
            db_deadline: Duration::from_secs(30),
        }
    }
}
