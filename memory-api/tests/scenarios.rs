//! Cross-crate scenarios exercising memory-core, memory-search,
//! memory-detector and memory-envelope together through the same
//! wiring `bootstrap.rs` assembles in production, minus Postgres.

use std::sync::Arc;

use memory_core::{
    InMemoryMemoryRepository, MemoryCore, MemoryCoreConfig, MemoryRepository, StoreInput,
};
use memory_embeddings::MockEmbeddingProvider;
use memory_envelope::CryptoEnvelope;
use memory_search::{HybridSearch, SearchQuery};

fn store_input(content: &str) -> StoreInput {
    StoreInput {
        content: content.to_string(),
        category: Default::default(),
        memory_type: Default::default(),
        priority: Default::default(),
        update_key: None,
        tags: Vec::new(),
        metadata: serde_json::json!({}),
    }
}

/// S1 — update key replaces content, same id preserved.
#[tokio::test]
async fn update_key_replaces_content_in_place() {
    let repo = Arc::new(InMemoryMemoryRepository::new());
    let embeddings = Arc::new(MockEmbeddingProvider::new());
    let core = MemoryCore::new(repo.clone(), embeddings, None, MemoryCoreConfig::default());

    let first = core
        .store_or_update(1, StoreInput { update_key: Some("preference:typescript".into()), ..store_input("I prefer TypeScript over JavaScript") })
        .await
        .unwrap();

    let second = core
        .store_or_update(1, StoreInput { update_key: Some("preference:typescript".into()), ..store_input("I prefer TypeScript over Python") })
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(core.count(1).await.unwrap(), 1);
    let reread = core.get_by_id(1, first.id).await.unwrap();
    assert_eq!(reread.content, "I prefer TypeScript over Python");
}

/// S2 — quota eviction keeps the most recent N, dropping the oldest.
#[tokio::test]
async fn quota_evicts_oldest_first() {
    let repo = Arc::new(InMemoryMemoryRepository::new());
    let embeddings = Arc::new(MockEmbeddingProvider::new());
    let config = MemoryCoreConfig { max_memories: 3, ..MemoryCoreConfig::default() };
    let core = MemoryCore::new(repo.clone(), embeddings, None, config);

    for content in ["a", "b", "c", "d"] {
        core.store_or_update(1, store_input(content)).await.unwrap();
    }

    assert_eq!(core.count(1).await.unwrap(), 3);
    let outcome = HybridSearch::new(repo, None, None)
        .search(1, &SearchQuery { query: "*".into(), category: None, memory_type: None, limit: None, use_semantic: None })
        .await
        .unwrap();
    let mut contents: Vec<&str> = outcome.results.iter().map(|m| m.content.as_str()).collect();
    contents.sort();
    assert_eq!(contents, vec!["b", "c", "d"]);
}

/// S3 — a sensitive mention suppresses detection entirely, so nothing
/// downstream of the detector ever sees a candidate to store.
#[test]
fn sensitive_text_yields_no_candidates() {
    let found = memory_detector::detect("My password is hunter2");
    assert!(found.is_empty());
}

/// S4 — semantic search against a corpus with no embedded rows yet
/// returns empty, never silently degrading to a keyword match.
#[tokio::test]
async fn semantic_search_on_unembedded_corpus_is_empty() {
    let repo = Arc::new(InMemoryMemoryRepository::new());
    let embeddings = Arc::new(MockEmbeddingProvider::new());
    let core = MemoryCore::new(repo.clone(), embeddings.clone(), None, MemoryCoreConfig::default());
    core.store_or_update(1, store_input("the sky is blue")).await.unwrap();

    let search = HybridSearch::new(repo, Some(embeddings), None);
    let outcome = search
        .search(
            1,
            &SearchQuery { query: "anything".into(), category: None, memory_type: None, limit: None, use_semantic: Some(true) },
        )
        .await
        .unwrap();

    assert!(outcome.results.is_empty());
    assert!(outcome.used_semantic);
}

/// S5 — a wildcard query lists everything but is not itself loggable as
/// a search (the activity-recording decision lives one layer up in
/// `memory-api::ops`, gated on `is_list_all`).
#[tokio::test]
async fn wildcard_query_lists_all_and_is_not_flagged_as_search() {
    let repo = Arc::new(InMemoryMemoryRepository::new());
    let embeddings = Arc::new(MockEmbeddingProvider::new());
    let core = MemoryCore::new(repo.clone(), embeddings, None, MemoryCoreConfig::default());
    core.store_or_update(1, store_input("one")).await.unwrap();
    core.store_or_update(1, store_input("two")).await.unwrap();

    let search = HybridSearch::new(repo, None, None);
    let outcome = search
        .search(1, &SearchQuery { query: "*".into(), category: None, memory_type: None, limit: None, use_semantic: None })
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 2);
    assert!(outcome.is_list_all);
}

/// S6 — with encryption enabled, the row on disk carries the sentinel
/// and an encrypted_content payload, but the value handed back to the
/// caller is the original plaintext.
#[tokio::test]
async fn encrypted_round_trip_hides_content_at_rest() {
    let repo = Arc::new(InMemoryMemoryRepository::new());
    let embeddings = Arc::new(MockEmbeddingProvider::new());
    let key = CryptoEnvelope::generate_master_key();
    let envelope = Arc::new(CryptoEnvelope::from_base64(&key).unwrap());
    let core = MemoryCore::new(repo.clone(), embeddings, Some(envelope), MemoryCoreConfig::default());

    let stored = core.store_or_update(1, store_input("hello")).await.unwrap();
    assert_eq!(stored.content, "hello");

    let raw = repo.get_by_id(1, stored.id).await.unwrap().unwrap();
    assert!(raw.is_encrypted);
    assert_eq!(raw.content, memory_core::ENCRYPTED_SENTINEL);
    assert!(raw.encrypted_content.is_some());

    let reread = core.get_by_id(1, stored.id).await.unwrap();
    assert_eq!(reread.content, "hello");
}

/// Edge behavior: storing empty content is rejected before a row is
/// ever created.
#[tokio::test]
async fn empty_content_never_creates_a_row() {
    let repo = Arc::new(InMemoryMemoryRepository::new());
    let embeddings = Arc::new(MockEmbeddingProvider::new());
    let core = MemoryCore::new(repo.clone(), embeddings, None, MemoryCoreConfig::default());

    let err = core.store_or_update(1, store_input("")).await.unwrap_err();
    assert!(matches!(err, memory_core::MemoryError::Validation { .. }));
    assert_eq!(core.count(1).await.unwrap(), 0);
}

/// Edge behavior: deleting another user's memory id reports NotFound
/// rather than silently succeeding or leaking existence.
#[tokio::test]
async fn delete_across_users_is_not_found() {
    let repo = Arc::new(InMemoryMemoryRepository::new());
    let embeddings = Arc::new(MockEmbeddingProvider::new());
    let core = MemoryCore::new(repo, embeddings, None, MemoryCoreConfig::default());

    let mine = core.store_or_update(1, store_input("only mine")).await.unwrap();
    let err = core.delete(2, mine.id).await.unwrap_err();
    assert!(matches!(err, memory_core::MemoryError::NotFound));
}
