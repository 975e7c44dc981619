//! # memory-core
//!
//! The deduplicating store-or-update engine: CRUD, dedup/upsert against
//! `update_key` or exact content match, per-user quota eviction,
//! asynchronous embedding maintenance, and transparent envelope
//! encryption on every read/write path.

mod config;
mod core;
mod encryption;
pub mod error;
mod repository;
mod repository_memory;
mod repository_pg;
pub mod types;

pub use config::MemoryCoreConfig;
pub use core::MemoryCore;
pub use error::MemoryError;
pub use repository::MemoryRepository;
pub use repository_memory::InMemoryMemoryRepository;
pub use repository_pg::PgMemoryRepository;
pub use types::{
    Category, GrowthPoint, Memory, MemoryType, Priority, StoreInput, UpdateInput, UserId,
    ENCRYPTED_SENTINEL, SYSTEM_USER_ID,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use memory_embeddings::MockEmbeddingProvider;
    use memory_envelope::CryptoEnvelope;

    use super::*;

    fn test_core() -> MemoryCore<InMemoryMemoryRepository> {
        let repo = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        MemoryCore::new(repo, embeddings, None, MemoryCoreConfig::default())
    }

    fn store(content: &str, update_key: Option<&str>) -> StoreInput {
        StoreInput {
            content: content.to_string(),
            update_key: update_key.map(str::to_string),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let core = test_core();
        let err = core.store_or_update(1, store("", None)).await.unwrap_err();
        assert!(matches!(err, MemoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn update_key_replaces_content_same_id() {
        // S1
        let core = test_core();
        let first = core
            .store_or_update(1, store("I prefer TypeScript over JavaScript", Some("preference:typescript")))
            .await
            .unwrap();
        let second = core
            .store_or_update(1, store("I prefer TypeScript over Python", Some("preference:typescript")))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(core.count(1).await.unwrap(), 1);
        assert_eq!(second.content, "I prefer TypeScript over Python");
    }

    #[tokio::test]
    async fn exact_content_match_dedups_without_update_key() {
        let core = test_core();
        let first = core.store_or_update(1, store("same text", None)).await.unwrap();
        let second = core.store_or_update(1, store("same text", None)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(core.count(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn quota_evicts_oldest() {
        // S2
        let mut cfg = MemoryCoreConfig::default();
        cfg.max_memories = 3;
        let repo = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let core = MemoryCore::new(repo, embeddings, None, cfg);

        for c in ["a", "b", "c", "d"] {
            core.store_or_update(1, store(c, None)).await.unwrap();
        }

        assert_eq!(core.count(1).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn growth_counts_todays_stores() {
        let core = test_core();
        core.store_or_update(1, store("a", None)).await.unwrap();
        core.store_or_update(1, store("b", None)).await.unwrap();

        let points = core.growth(1, 7).await.unwrap();
        let total: i64 = points.iter().map(|p| p.count).sum();
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn delete_unknown_id_is_not_found() {
        let core = test_core();
        let err = core.delete(1, uuid::Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, MemoryError::NotFound));
    }

    #[tokio::test]
    async fn delete_another_users_memory_is_not_found() {
        let core = test_core();
        let mine = core.store_or_update(1, store("secret", None)).await.unwrap();
        let err = core.delete(2, mine.id).await.unwrap_err();
        assert!(matches!(err, MemoryError::NotFound));
    }

    #[tokio::test]
    async fn update_by_id_patches_only_given_fields() {
        let core = test_core();
        let created = core.store_or_update(1, store("original", None)).await.unwrap();

        let patched = core
            .update_by_id(1, created.id, UpdateInput { priority: Some(Priority::High), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(patched.content, "original");
        assert_eq!(patched.priority, Priority::High);
    }

    #[tokio::test]
    async fn encrypted_round_trip_on_store_and_read() {
        // S6
        let key = CryptoEnvelope::generate_master_key();
        let envelope = Arc::new(CryptoEnvelope::from_base64(&key).unwrap());
        let repo = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let core = MemoryCore::new(repo.clone(), embeddings, Some(envelope), MemoryCoreConfig::default());

        let stored = core.store_or_update(1, store("hello", None)).await.unwrap();
        assert_eq!(stored.content, "hello");

        let raw = repo.get_by_id(1, stored.id).await.unwrap().unwrap();
        assert!(raw.is_encrypted);
        assert_eq!(raw.content, ENCRYPTED_SENTINEL);

        let fetched = core.get_by_id(1, stored.id).await.unwrap();
        assert_eq!(fetched.content, "hello");
    }
}
