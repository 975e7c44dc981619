//! Storage abstraction for memories: where rows live.
//!
//! Implement this trait for your infrastructure:
//! - `InMemoryMemoryRepository` (tests)
//! - `PgMemoryRepository` (production, Postgres + pgvector)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MemoryError;
use crate::types::{Category, GrowthPoint, Memory, MemoryType, UserId};

#[async_trait]
pub trait MemoryRepository: Send + Sync {
    async fn find_by_update_key(
        &self,
        user_id: UserId,
        update_key: &str,
    ) -> Result<Option<Memory>, MemoryError>;

    async fn find_by_exact_content(
        &self,
        user_id: UserId,
        content: &str,
    ) -> Result<Option<Memory>, MemoryError>;

    async fn get_by_id(&self, user_id: UserId, id: Uuid) -> Result<Option<Memory>, MemoryError>;

    async fn insert(&self, memory: Memory) -> Result<Memory, MemoryError>;

    /// Persist the mutable fields without touching `embedding` — update-in-place
    /// never clobbers a pending/present vector.
    async fn update_fields(&self, memory: Memory) -> Result<Memory, MemoryError>;

    /// Write only the `embedding` column for a row (step 2).
    async fn update_embedding(
        &self,
        id: Uuid,
        embedding: Option<Vec<f32>>,
    ) -> Result<(), MemoryError>;

    async fn delete(&self, user_id: UserId, id: Uuid) -> Result<bool, MemoryError>;

    async fn count_for_user(&self, user_id: UserId) -> Result<i64, MemoryError>;

    /// The N oldest rows for `user_id`, ascending by `created_at` — the
    /// eviction candidates for quota enforcement.
    async fn oldest_for_user(&self, user_id: UserId, n: i64) -> Result<Vec<Memory>, MemoryError>;

    async fn search_keyword(
        &self,
        user_id: UserId,
        query: Option<&str>,
        category: Option<Category>,
        memory_type: Option<MemoryType>,
        limit: i64,
    ) -> Result<Vec<Memory>, MemoryError>;

    async fn search_semantic(
        &self,
        user_id: UserId,
        query_embedding: &[f32],
        category: Option<Category>,
        memory_type: Option<MemoryType>,
        limit: i64,
    ) -> Result<Vec<Memory>, MemoryError>;

    /// Whether any row for this user currently carries an embedding — used
    /// to detect the cold-start case.
    async fn has_any_embedding(&self, user_id: UserId) -> Result<bool, MemoryError>;

    async fn daily_growth(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GrowthPoint>, MemoryError>;
}
