use memory_core::{Category, MemoryType, Priority};

/// A memory candidate extracted from free text, not yet persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedMemory {
    pub content: String,
    pub memory_type: MemoryType,
    pub category: Category,
    pub priority: Priority,
    pub update_key: Option<String>,
    /// In `[0, 1]`. Callers typically filter `confidence >= 0.5` before
    /// persisting.
    pub confidence: f32,
}
