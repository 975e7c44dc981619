//! Operation layer shared by the JSON-RPC tool surface and the REST
//! surface ("Two parallel tool surfaces" — one function per
//! operation, bound into both dispatch tables instead of being
//! reimplemented on each).

use uuid::Uuid;

use memory_activity::ActivityKind;
use memory_core::{
    Category, Memory, MemoryRepository, MemoryType, Priority, StoreInput, UpdateInput, UserId,
};
use memory_search::{SearchOutcome, SearchQuery};

/// Candidates below this confidence are discarded rather than persisted
/// ("callers typically filter confidence >= 0.5").
const AUTO_DETECT_MIN_CONFIDENCE: f32 = 0.5;

use crate::error::ApiError;
use crate::state::{AppState, HealthCheck as _};
use memory_activity::ActivityRepository;

fn parse_enum<T>(field: &str, value: &Option<String>, parse: impl Fn(&str) -> Option<T>) -> Result<Option<T>, ApiError> {
    match value {
        None => Ok(None),
        Some(s) => parse(s)
        .map(Some)
        .ok_or_else(|| ApiError::Validation { field: field.to_string(), reason: format!("unrecognized value '{s}'") }),
    }
}

#[derive(Clone, Debug, Default)]
pub struct StoreArgs {
    pub content: String,
    pub category: Option<String>,
    pub memory_type: Option<String>,
    pub priority: Option<String>,
    pub update_key: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<serde_json::Value>,
}

impl StoreArgs {
    fn into_input(self) -> Result<StoreInput, ApiError> {
        if self.content.is_empty() {
            return Err(ApiError::Validation { field: "content".to_string(), reason: "must not be empty".to_string() });
        }
        Ok(StoreInput {
            content: self.content,
            category: parse_enum("category", &self.category, Category::parse)?.unwrap_or_default(),
            memory_type: parse_enum("type", &self.memory_type, MemoryType::parse)?.unwrap_or_default(),
            priority: parse_enum("priority", &self.priority, Priority::parse)?.unwrap_or_default(),
            update_key: self.update_key,
            tags: self.tags.unwrap_or_default(),
            metadata: self.metadata.unwrap_or_else(|| serde_json::json!({})),
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct UpdateArgs {
    pub content: Option<String>,
    pub category: Option<String>,
    pub memory_type: Option<String>,
    pub priority: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<serde_json::Value>,
}

impl UpdateArgs {
    fn into_input(self) -> Result<UpdateInput, ApiError> {
        Ok(UpdateInput {
            content: self.content,
            category: parse_enum("category", &self.category, Category::parse)?,
            memory_type: parse_enum("type", &self.memory_type, MemoryType::parse)?,
            priority: parse_enum("priority", &self.priority, Priority::parse)?,
            tags: self.tags,
            metadata: self.metadata,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchArgs {
    pub query: String,
    pub category: Option<String>,
    pub memory_type: Option<String>,
    pub limit: Option<i64>,
    pub use_semantic: Option<bool>,
}

impl SearchArgs {
    fn into_query(self) -> Result<SearchQuery, ApiError> {
        Ok(SearchQuery {
            query: self.query,
            category: parse_enum("category", &self.category, Category::parse)?,
            memory_type: parse_enum("type", &self.memory_type, MemoryType::parse)?,
            limit: self.limit,
            use_semantic: self.use_semantic,
        })
    }
}

pub async fn store_memory<R, A>(
    state: &AppState<R, A>,
    user_id: UserId,
    args: StoreArgs,
) -> Result<Memory, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let category = args.category.clone();
    let input = args.into_input()?;
    let memory = state.core.store_or_update(user_id, input).await?;
    state.activity.record(
        user_id,
        ActivityKind::MemoryStored,
        serde_json::json!({ "category": category.unwrap_or_else(|| memory.category.to_string()) }),
    );
    Ok(memory)
}

pub async fn store_memories_bulk<R, A>(
    state: &AppState<R, A>,
    user_id: UserId,
    items: Vec<StoreArgs>,
) -> Result<Vec<Memory>, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let mut stored = Vec::with_capacity(items.len());
    for item in items {
        stored.push(store_memory(state, user_id, item).await?);
    }
    Ok(stored)
}

pub async fn search_memories<R, A>(
    state: &AppState<R, A>,
    user_id: UserId,
    args: SearchArgs,
) -> Result<SearchOutcome, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let query = args.into_query()?;
    let raw_query = query.query.clone();
    let outcome = state.search.search(user_id, &query).await?;

    // A bare "*" wildcard listing is not a "search" for activity-logging
    // purposes.
    if !outcome.is_list_all {
        state.activity.record(
            user_id,
            ActivityKind::MemorySearch,
            serde_json::json!({ "query": raw_query, "results": outcome.results.len() }),
        );
    }

    Ok(outcome)
}

/// Auto-detect: run the pattern detector over free text and persist every
/// candidate that clears the confidence floor, using the same
/// store-or-update path a client's own `store_memory` call would take.
pub async fn auto_detect_store<R, A>(
    state: &AppState<R, A>,
    user_id: UserId,
    text: &str,
) -> Result<Vec<Memory>, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let mut stored = Vec::new();
    for candidate in memory_detector::detect(text) {
        if candidate.confidence < AUTO_DETECT_MIN_CONFIDENCE {
            continue;
        }
        let input = StoreInput {
            content: candidate.content,
            category: candidate.category,
            memory_type: candidate.memory_type,
            priority: candidate.priority,
            update_key: candidate.update_key,
            tags: Vec::new(),
            metadata: serde_json::json!({}),
        };
        let memory = state.core.store_or_update(user_id, input).await?;
        state.activity.record(
            user_id,
            ActivityKind::MemoryStored,
            serde_json::json!({ "category": memory.category.to_string(), "auto_detected": true }),
        );
        stored.push(memory);
    }
    Ok(stored)
}

pub async fn update_memory<R, A>(
    state: &AppState<R, A>,
    user_id: UserId,
    id: Uuid,
    args: UpdateArgs,
) -> Result<Memory, ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    let input = args.into_input()?;
    Ok(state.core.update_by_id(user_id, id, input).await?)
}

pub async fn delete_memory<R, A>(
    state: &AppState<R, A>,
    user_id: UserId,
    id: Uuid,
) -> Result<(), ApiError>
where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    state.core.delete(user_id, id).await?;
    state.activity.record(user_id, ActivityKind::MemoryDeleted, serde_json::json!({ "id": id.to_string() }));
    Ok(())
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub database: HealthDatabase,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct HealthDatabase {
    pub healthy: bool,
    pub error: Option<String>,
}

pub async fn health_check<R, A>(state: &AppState<R, A>) -> HealthReport
    where
    R: MemoryRepository + 'static,
A: ActivityRepository + 'static,
{
    match state.health.check().await {
        Ok(()) => HealthReport {
            status: "ok",
            timestamp: chrono::Utc::now(),
            database: HealthDatabase { healthy: true, error: None },
        },
        Err(e) => HealthReport {
            status: "unavailable",
            timestamp: chrono::Utc::now(),
            database: HealthDatabase { healthy: false, error: Some(e) },
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use memory_core::{InMemoryMemoryRepository, MemoryCoreConfig};
    use memory_embeddings::MockEmbeddingProvider;

    use super::*;
    use crate::auth::LocalAuthenticator;
    use crate::state::AlwaysHealthy;
    use memory_activity::InMemoryActivityRepository;
    use memory_search::HybridSearch;

    fn test_state() -> AppState<InMemoryMemoryRepository, InMemoryActivityRepository> {
        let memories = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let core = memory_core::MemoryCore::new(memories.clone(), embeddings.clone(), None, MemoryCoreConfig::default());
        let search = HybridSearch::new(memories.clone(), Some(embeddings), None);
        let activity_repo = Arc::new(InMemoryActivityRepository::new());
        let activity =
            memory_activity::ActivityLedger::new(activity_repo, memories, chrono::FixedOffset::east_opt(0).unwrap());

        AppState {
            core,
            search,
            activity,
            authenticator: Arc::new(LocalAuthenticator),
            health: Arc::new(AlwaysHealthy),
            config: crate::config::AppConfig::load(None).unwrap_or_else(|_| panic!("env defaults must be valid")),
            started_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn store_then_search_round_trip() {
        let state = test_state();
        store_memory(&state, 1, StoreArgs { content: "I prefer TypeScript".into(), ..Default::default() })
        .await
            .unwrap();

        let outcome = search_memories(
            &state,
            1,
            SearchArgs { query: "*".into(), ..Default::default() },
        )
        .await
            .unwrap();
        assert_eq!(outcome.results.len(), 1);
    }

    #[tokio::test]
    async fn empty_content_is_validation_error() {
        let state = test_state();
        let err = store_memory(&state, 1, StoreArgs::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
    }

    #[tokio::test]
    async fn delete_unknown_is_not_found() {
        let state = test_state();
        let err = delete_memory(&state, 1, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn auto_detect_skips_sensitive_content() {
        // S3
        let state = test_state();
        let stored = auto_detect_store(&state, 1, "My password is hunter2").await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn auto_detect_persists_confident_candidates() {
        let state = test_state();
        let stored = auto_detect_store(&state, 1, "I prefer TypeScript over JavaScript").await.unwrap();
        assert!(!stored.is_empty());
    }

    #[tokio::test]
    async fn bulk_store_persists_every_item() {
        let state = test_state();
        let items = vec![
            StoreArgs { content: "a".into(), ..Default::default() },
            StoreArgs { content: "b".into(), ..Default::default() },
        ];
        let stored = store_memories_bulk(&state, 1, items).await.unwrap();
        assert_eq!(stored.len(), 2);
    }
}
