//! # memory-activity
//!
//! Append-only ledger of user activity and request latency, plus the
//! rollup queries the dashboard and tool surfaces read from it. Recording
//! is fire-and-forget: nothing in this crate can fail a caller's request.

mod ledger;
mod repository;
mod repository_memory;
mod repository_pg;
mod stats;
pub mod types;

pub use ledger::ActivityLedger;
pub use repository::ActivityRepository;
pub use repository_memory::InMemoryActivityRepository;
pub use repository_pg::PgActivityRepository;
pub use types::{
    ActivityEntry, ActivityKind, LatencySample, PerformanceStats, RecentActivityItem,
    SearchStats, UserActivityStats,
};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;
    use memory_core::{InMemoryMemoryRepository, MemoryCore, MemoryCoreConfig, StoreInput};
    use memory_embeddings::MockEmbeddingProvider;

    use super::*;

    fn test_ledger(
    ) -> ActivityLedger<InMemoryActivityRepository, InMemoryMemoryRepository> {
        let activity = Arc::new(InMemoryActivityRepository::new());
        let memories = Arc::new(InMemoryMemoryRepository::new());
        ActivityLedger::new(activity, memories, chrono::FixedOffset::east_opt(0).unwrap())
    }

    #[tokio::test]
    async fn recording_is_fire_and_forget_and_eventually_visible() {
        let ledger = test_ledger();
        ledger.record(1, ActivityKind::MemorySearch, serde_json::json!({ "query": "rust" }));
        // Give the detached task a chance to run.
        tokio::task::yield_now().await;
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let stats = ledger.search_stats(1).await.unwrap();
        assert_eq!(stats.searches_today, 1);
    }

    #[tokio::test]
    async fn recent_activity_renders_human_readable_descriptions() {
        let ledger = test_ledger();
        ledger.record(7, ActivityKind::MemoryStored, serde_json::json!({ "category": "project" }));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let recent = ledger.recent_activity(7, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].description, "Stored memory in project category");
    }

    #[tokio::test]
    async fn most_used_categories_reads_from_memories_not_the_log() {
        let memories_repo = Arc::new(InMemoryMemoryRepository::new());
        let embeddings = Arc::new(MockEmbeddingProvider::new());
        let core = MemoryCore::new(
            memories_repo.clone(),
            embeddings,
            None,
            MemoryCoreConfig::default(),
        );
        core.store_or_update(
            3,
            StoreInput {
                content: "prefers dark mode".to_string(),
                ..Default::default()
            },
        )
        .await
            .unwrap();

        let activity = Arc::new(InMemoryActivityRepository::new());
        let ledger = ActivityLedger::new(activity, memories_repo, chrono::FixedOffset::east_opt(0).unwrap());
        let counts = ledger.most_used_categories(3).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].1, 1);
    }

    #[tokio::test]
    async fn performance_stats_reflects_recorded_latency() {
        let ledger = test_ledger();
        ledger.record_latency("/api/v1/memories", "GET", 42, 200, Some(1), None);
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let perf = ledger.performance_stats(5, 99.9, 0.8).await.unwrap();
        assert_eq!(perf.total_requests_today, 1);
        assert_eq!(perf.avg_duration_ms_today, 42.0);
    }

    #[tokio::test]
    async fn user_activity_stats_assembles_all_fields() {
        let ledger = test_ledger();
        ledger.record(9, ActivityKind::Login, serde_json::json!({}));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;

        let stats = ledger
            .user_activity_stats(9, 2, 1, Utc::now(), Some(Utc::now()), 5)
            .await
            .unwrap();
        assert_eq!(stats.total_api_keys, 2);
        assert_eq!(stats.active_api_keys, 1);
        assert_eq!(stats.recent_activity.len(), 1);
    }
}
