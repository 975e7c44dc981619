//! In-memory repository used by tests and by the standalone CLI demo mode.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MemoryError;
use crate::repository::MemoryRepository;
use crate::types::{Category, GrowthPoint, Memory, MemoryType, UserId};
use memory_embeddings::cosine_similarity;

#[derive(Default)]
pub struct InMemoryMemoryRepository {
    rows: RwLock<HashMap<Uuid, Memory>>,
}

impl InMemoryMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemoryRepository for InMemoryMemoryRepository {
    async fn find_by_update_key(
        &self,
        user_id: UserId,
        update_key: &str,
    ) -> Result<Option<Memory>, MemoryError> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .values()
            .find(|m| m.user_id == user_id && m.update_key.as_deref() == Some(update_key))
            .cloned())
    }

    async fn find_by_exact_content(
        &self,
        user_id: UserId,
        content: &str,
    ) -> Result<Option<Memory>, MemoryError> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .values()
            .find(|m| m.user_id == user_id && m.content == content)
            .cloned())
    }

    async fn get_by_id(&self, user_id: UserId, id: Uuid) -> Result<Option<Memory>, MemoryError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.get(&id).filter(|m| m.user_id == user_id).cloned())
    }

    async fn insert(&self, memory: Memory) -> Result<Memory, MemoryError> {
        let mut rows = self.rows.write().unwrap();
        rows.insert(memory.id, memory.clone());
        Ok(memory)
    }

    async fn update_fields(&self, memory: Memory) -> Result<Memory, MemoryError> {
        let mut rows = self.rows.write().unwrap();
        let embedding = rows.get(&memory.id).and_then(|m| m.embedding.clone());
        let mut memory = memory;
        memory.embedding = embedding;
        rows.insert(memory.id, memory.clone());
        Ok(memory)
    }

    async fn update_embedding(
        &self,
        id: Uuid,
        embedding: Option<Vec<f32>>,
    ) -> Result<(), MemoryError> {
        let mut rows = self.rows.write().unwrap();
        if let Some(m) = rows.get_mut(&id) {
            m.embedding = embedding;
        }
        Ok(())
    }

    async fn delete(&self, user_id: UserId, id: Uuid) -> Result<bool, MemoryError> {
        let mut rows = self.rows.write().unwrap();
        let existed = rows.get(&id).is_some_and(|m| m.user_id == user_id);
        if existed {
            rows.remove(&id);
        }
        Ok(existed)
    }

    async fn count_for_user(&self, user_id: UserId) -> Result<i64, MemoryError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.values().filter(|m| m.user_id == user_id).count() as i64)
    }

    async fn oldest_for_user(&self, user_id: UserId, n: i64) -> Result<Vec<Memory>, MemoryError> {
        let rows = self.rows.read().unwrap();
        let mut mine: Vec<Memory> =
            rows.values().filter(|m| m.user_id == user_id).cloned().collect();
        mine.sort_by_key(|m| m.created_at);
        mine.truncate(n.max(0) as usize);
        Ok(mine)
    }

    async fn search_keyword(
        &self,
        user_id: UserId,
        query: Option<&str>,
        category: Option<Category>,
        memory_type: Option<MemoryType>,
        limit: i64,
    ) -> Result<Vec<Memory>, MemoryError> {
        let rows = self.rows.read().unwrap();
        let needle = query.map(|q| q.to_lowercase());
        let mut mine: Vec<Memory> = rows
            .values()
            .filter(|m| m.user_id == user_id)
            .filter(|m| category.map_or(true, |c| m.category == c))
            .filter(|m| memory_type.map_or(true, |t| m.memory_type == t))
            .filter(|m| match &needle {
            Some(n) => m.content.to_lowercase().contains(n.as_str()),
            None => true,
        })
        .cloned()
        .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit.max(0) as usize);
        Ok(mine)
    }

    async fn search_semantic(
        &self,
        user_id: UserId,
        query_embedding: &[f32],
        category: Option<Category>,
        memory_type: Option<MemoryType>,
        limit: i64,
    ) -> Result<Vec<Memory>, MemoryError> {
        let rows = self.rows.read().unwrap();
        let mut scored: Vec<(f32, Memory)> = rows
            .values()
            .filter(|m| m.user_id == user_id)
            .filter(|m| m.embedding.is_some())
            .filter(|m| category.map_or(true, |c| m.category == c))
            .filter(|m| memory_type.map_or(true, |t| m.memory_type == t))
            .map(|m| {
            let sim = cosine_similarity(m.embedding.as_deref().unwrap_or(&[]), query_embedding);
            (sim, m.clone())
        })
        .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit.max(0) as usize);
        Ok(scored.into_iter().map(|(_, m)| m).collect())
    }

    async fn has_any_embedding(&self, user_id: UserId) -> Result<bool, MemoryError> {
        let rows = self.rows.read().unwrap();
        Ok(rows.values().any(|m| m.user_id == user_id && m.embedding.is_some()))
    }

    async fn daily_growth(
        &self,
        user_id: UserId,
        since: DateTime<Utc>,
    ) -> Result<Vec<GrowthPoint>, MemoryError> {
        let rows = self.rows.read().unwrap();
        let mut counts: HashMap<chrono::NaiveDate, i64> = HashMap::new();
        for m in rows.values().filter(|m| m.user_id == user_id && m.created_at >= since) {
            *counts.entry(m.created_at.date_naive()).or_insert(0) += 1;
        }
        let mut points: Vec<GrowthPoint> =
            counts.into_iter().map(|(date, count)| GrowthPoint { date, count }).collect();
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}
