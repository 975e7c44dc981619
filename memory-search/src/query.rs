use memory_core::{Category, MemoryType};

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

#[derive(Clone, Debug, Default)]
pub struct SearchQuery {
    pub query: String,
    pub category: Option<Category>,
    pub memory_type: Option<MemoryType>,
    pub limit: Option<i64>,
    pub use_semantic: Option<bool>,
}

/// Normalized form of a [`SearchQuery`] ("Normalization").
pub(crate) struct Normalized {
    pub is_list_all: bool,
    pub keyword: Option<String>,
    pub limit: i64,
    pub use_semantic: bool,
}

pub(crate) fn normalize(q: &SearchQuery) -> Normalized {
    let trimmed = q.query.trim();
    let is_list_all = trimmed.is_empty() || trimmed == "*";

    let limit = match q.limit {
        Some(l) if l > 0 => l.min(MAX_LIMIT),
        _ => DEFAULT_LIMIT,
    };

    let use_semantic = if is_list_all {
        false
    } else {
        q.use_semantic.unwrap_or(true)
    };

    Normalized {
        is_list_all,
        keyword: if is_list_all { None } else { Some(trimmed.to_string()) },
        limit,
        use_semantic,
    }
}
