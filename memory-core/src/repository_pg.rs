//! Postgres + pgvector repository — the production `MemoryRepository`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgvector::Vector;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::MemoryError;
use crate::repository::MemoryRepository;
use crate::types::{Category, GrowthPoint, Memory, MemoryType, Priority, UserId};

pub struct PgMemoryRepository {
    pool: PgPool,
}

impl PgMemoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_memory(row: &PgRow) -> Result<Memory, MemoryError> {
        let memory_type: String = row.try_get("type").map_err(MemoryError::from)?;
        let category: String = row.try_get("category").map_err(MemoryError::from)?;
        let priority: String = row.try_get("priority").map_err(MemoryError::from)?;
        let embedding: Option<Vector> = row.try_get("embedding").map_err(MemoryError::from)?;
        let tags: Vec<String> = row.try_get("tags").map_err(MemoryError::from)?;

        Ok(Memory {
            id: row.try_get("id").map_err(MemoryError::from)?,
            user_id: row.try_get("user_id").map_err(MemoryError::from)?,
            memory_type: MemoryType::parse(&memory_type)
            .ok_or_else(|| MemoryError::database("row decode", "unknown memory type"))?,
            category: Category::parse(&category)
            .ok_or_else(|| MemoryError::database("row decode", "unknown category"))?,
            content: row.try_get("content").map_err(MemoryError::from)?,
            priority: Priority::parse(&priority)
            .ok_or_else(|| MemoryError::database("row decode", "unknown priority"))?,
            update_key: row.try_get("update_key").map_err(MemoryError::from)?,
            tags,
            metadata: row.try_get("metadata").map_err(MemoryError::from)?,
            embedding: embedding.map(|v| v.to_vec()),
            encrypted_content: row.try_get("encrypted_content").map_err(MemoryError::from)?,
            is_encrypted: row.try_get("is_encrypted").map_err(MemoryError::from)?,
            created_at: row.try_get("created_at").map_err(MemoryError::from)?,
            updated_at: row.try_get("updated_at").map_err(MemoryError::from)?,
        })
    }
}

const SELECT_COLUMNS: &str = "id, user_id, type, category, content, priority, update_key, \
    tags, metadata, embedding, encrypted_content, is_encrypted, created_at, updated_at";

#[async_trait]
impl MemoryRepository for PgMemoryRepository {
    async fn find_by_update_key(
        &self,
        user_id: UserId,
        update_key: &str,
    ) -> Result<Option<Memory>, MemoryError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE user_id = $1 AND update_key = $2"
        );
        let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(update_key)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_memory).transpose()
    }

    async fn find_by_exact_content(
        &self,
        user_id: UserId,
        content: &str,
    ) -> Result<Option<Memory>, MemoryError> {
        let sql =
            format!("SELECT {SELECT_COLUMNS} FROM memories WHERE user_id = $1 AND content = $2");
        let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_memory).transpose()
    }

    async fn get_by_id(&self, user_id: UserId, id: Uuid) -> Result<Option<Memory>, MemoryError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM memories WHERE id = $1 AND user_id = $2");
        let row = sqlx::query(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(Self::row_to_memory).transpose()
    }

    async fn insert(&self, memory: Memory) -> Result<Memory, MemoryError> {
        let sql = format!(
            "INSERT INTO memories (id, user_id, type, category, content, priority, update_key, \
            tags, metadata, embedding, encrypted_content, is_encrypted, created_at, updated_at) \
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14) \
            RETURNING {SELECT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
        .bind(memory.id)
        .bind(memory.user_id)
        .bind(memory.memory_type.to_string())
        .bind(memory.category.to_string())
        .bind(&memory.content)
        .bind(memory.priority.to_string())
        .bind(&memory.update_key)
        .bind(&memory.tags)
        .bind(&memory.metadata)
        .bind(memory.embedding.as_ref().map(|v| Vector::from(v.clone())))
        .bind(&memory.encrypted_content)
        .bind(memory.is_encrypted)
        .bind(memory.created_at)
        .bind(memory.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_memory(&row)
    }

    async fn update_fields(&self, memory: Memory) -> Result<Memory, MemoryError> {
        let sql = format!(
            "UPDATE memories SET type = $1, category = $2, content = $3, priority = $4, \
            update_key = $5, tags = $6, metadata = $7, encrypted_content = $8, \
            is_encrypted = $9, updated_at = $10 \
            WHERE id = $11 AND user_id = $12 RETURNING {SELECT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
        .bind(memory.memory_type.to_string())
        .bind(memory.category.to_string())
        .bind(&memory.content)
        .bind(memory.priority.to_string())
        .bind(&memory.update_key)
        .bind(&memory.tags)
        .bind(&memory.metadata)
        .bind(&memory.encrypted_content)
        .bind(memory.is_encrypted)
        .bind(memory.updated_at)
        .bind(memory.id)
        .bind(memory.user_id)
        .fetch_one(&self.pool)
        .await?;
        Self::row_to_memory(&row)
    }

    async fn update_embedding(
        &self,
        id: Uuid,
        embedding: Option<Vec<f32>>,
    ) -> Result<(), MemoryError> {
        sqlx::query("UPDATE memories SET embedding = $1 WHERE id = $2")
        .bind(embedding.map(Vector::from))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, user_id: UserId, id: Uuid) -> Result<bool, MemoryError> {
        let result = sqlx::query("DELETE FROM memories WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_for_user(&self, user_id: UserId) -> Result<i64, MemoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM memories WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("n")?)
    }

    async fn oldest_for_user(&self, user_id: UserId, n: i64) -> Result<Vec<Memory>, MemoryError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories WHERE user_id = $1 \
            ORDER BY created_at ASC LIMIT $2"
        );
        let rows = sqlx::query(&sql).bind(user_id).bind(n.max(0)).fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_memory).collect()
    }

    async fn search_keyword(
        &self,
        user_id: UserId,
        query: Option<&str>,
        category: Option<Category>,
        memory_type: Option<MemoryType>,
        limit: i64,
    ) -> Result<Vec<Memory>, MemoryError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories \
            WHERE user_id = $1 \
            AND ($2::text IS NULL OR content ILIKE '%' || $2 || '%') \
            AND ($3::text IS NULL OR category = $3) \
            AND ($4::text IS NULL OR type = $4) \
            ORDER BY created_at DESC LIMIT $5"
        );
        let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(query)
        .bind(category.map(|c| c.to_string()))
        .bind(memory_type.map(|t| t.to_string()))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_memory).collect()
    }

    async fn search_semantic(
        &self,
        user_id: UserId,
        query_embedding: &[f32],
        category: Option<Category>,
        memory_type: Option<MemoryType>,
        limit: i64,
    ) -> Result<Vec<Memory>, MemoryError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM memories \
            WHERE user_id = $1 AND embedding IS NOT NULL \
            AND ($2::text IS NULL OR category = $2) \
            AND ($3::text IS NULL OR type = $3) \
            ORDER BY embedding <=> $4 ASC LIMIT $5"
        );
        let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(category.map(|c| c.to_string()))
        .bind(memory_type.map(|t| t.to_string()))
        .bind(Vector::from(query_embedding.to_vec()))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(Self::row_to_memory).collect()
    }

    async fn has_any_embedding(&self, user_id: UserId) -> Result<bool, MemoryError> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM memories WHERE user_id = $1 AND embedding IS NOT NULL) AS e",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("e")?)
    }

    async fn daily_growth(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GrowthPoint>, MemoryError> {
        let rows = sqlx::query(
            "SELECT created_at::date AS date, COUNT(*) AS count FROM memories \
            WHERE user_id = $1 AND created_at >= $2 \
            GROUP BY created_at::date ORDER BY date ASC",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
        .map(|row| {
            Ok(GrowthPoint {
                date: row.try_get("date")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
    }
}
