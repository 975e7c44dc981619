//! # memory-search
//!
//! Keyword substring search plus vector ANN search over the same corpus,
//! sharing a common filter model and a defined fallback precedence
//! between them.

mod query;
mod search;

pub use query::SearchQuery;
pub use search::{HybridSearch, SearchOutcome};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use memory_core::{InMemoryMemoryRepository, MemoryCore, MemoryCoreConfig, StoreInput};
    use memory_embeddings::MockEmbeddingProvider;

    use super::*;

    async fn seeded_core() -> (MemoryCore<InMemoryMemoryRepository>, Arc<InMemoryMemoryRepository>) {
        let repo = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let core = MemoryCore::new(repo.clone(), embeddings, None, MemoryCoreConfig::default());
        (core, repo)
    }

    #[tokio::test]
    async fn wildcard_lists_everything_without_semantic() {
        // S5
        let (core, repo) = seeded_core().await;
        core.store_or_update(1, StoreInput { content: "a".into(), ..Default::default() })
        .await
            .unwrap();
        core.store_or_update(1, StoreInput { content: "b".into(), ..Default::default() })
        .await
            .unwrap();

        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let search = HybridSearch::new(repo, Some(embeddings), None);
        let outcome = search
            .search(1, &SearchQuery { query: "*".into(), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 2);
        assert!(outcome.is_list_all);
        assert!(!outcome.used_semantic);
    }

    #[tokio::test]
    async fn semantic_search_returns_empty_on_cold_start() {
        // S4
        let repo = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let search = HybridSearch::new(repo, Some(embeddings), None);

        let outcome = search
            .search(
            1,
            &SearchQuery { query: "anything".into(), use_semantic: Some(true), ..Default::default() },
        )
        .await
            .unwrap();

        assert!(outcome.results.is_empty());
        assert!(outcome.used_semantic);
    }

    #[tokio::test]
    async fn keyword_search_matches_substring_case_insensitively() {
        let (core, repo) = seeded_core().await;
        core.store_or_update(1, StoreInput { content: "I love TypeScript".into(), ..Default::default() })
        .await
            .unwrap();

        let search: HybridSearch<InMemoryMemoryRepository> = HybridSearch::new(repo, None, None);
        let outcome = search
            .search(
            1,
            &SearchQuery { query: "typescript".into(), use_semantic: Some(false), ..Default::default() },
        )
        .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert!(!outcome.used_semantic);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_max() {
        let (_, repo) = seeded_core().await;
        let search: HybridSearch<InMemoryMemoryRepository> = HybridSearch::new(repo, None, None);
        let outcome = search
            .search(
            1,
            &SearchQuery {
                query: "x".into(),
                limit: Some(5000),
                use_semantic: Some(false),
                ..Default::default()
            },
        )
        .await
            .unwrap();
        assert!(outcome.results.len() <= 1000);
    }
}
