use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use memory_core::{MemoryRepository, UserId};
use uuid::Uuid;

use crate::repository::ActivityRepository;
use crate::stats::{
    performance_stats_from_durations, search_stats_from_counts, start_of_month, start_of_today,
    start_of_week, to_recent_activity_item,
};
use crate::types::{
    ActivityEntry, ActivityKind, LatencySample, PerformanceStats, RecentActivityItem,
    SearchStats, UserActivityStats,
};

/// Cap applied when tallying category counts from the memories table; a
/// user with more rows than this just gets an approximate breakdown.
const CATEGORY_TALLY_LIMIT: i64 = 10_000;

/// Facade over the activity/latency ledger plus whatever source of truth
/// the surrounding service uses for memories and API keys.
///
/// Growth and category breakdowns are read from `memories` via
/// `MemoryRepository`, never from the activity log — the log is
/// free to be pruned or to miss entries without corrupting those figures.
pub struct ActivityLedger<A, M>
    where
    A: ActivityRepository + 'static,
M: MemoryRepository + 'static,
{
    activity: Arc<A>,
    memories: Arc<M>,
    local_offset: FixedOffset,
}

impl<A, M> ActivityLedger<A, M>
    where
    A: ActivityRepository + 'static,
M: MemoryRepository + 'static,
{
    /// `local_offset` anchors "today"/"this week"/"this month" to the
    /// deployment's configured local time rather than UTC.
    pub fn new(activity: Arc<A>, memories: Arc<M>, local_offset: FixedOffset) -> Self {
        Self { activity, memories, local_offset }
    }

    /// Fire-and-forget: record an activity entry in the background. The
    /// caller's request path never waits on, or fails because of, the
    /// ledger.
    pub fn record(&self, user_id: UserId, kind: ActivityKind, detail: serde_json::Value) {
        self.record_with_context(user_id, kind, detail, None, None);
    }

    pub fn record_with_context(
        &self,
        user_id: UserId,
        kind: ActivityKind,
        detail: serde_json::Value,
        source_ip: Option<String>,
        user_agent: Option<String>,
    ) {
        let activity = self.activity.clone();
        let entry = ActivityEntry {
            id: Uuid::new_v4(),
            user_id,
            kind,
            detail,
            source_ip,
            user_agent,
            created_at: now(),
        };
        tokio::spawn(async move {
            if let Err(err) = activity.append_activity(entry).await {
                tracing::warn!(error = %err, "failed to append activity entry");
            }
        });
    }

    /// Fire-and-forget: record a request's latency and outcome.
    pub fn record_latency(
        &self,
        endpoint: impl Into<String>,
        method: impl Into<String>,
        duration_ms: i64,
        status_code: i32,
        user_id: Option<UserId>,
        error: Option<String>,
    ) {
        let activity = self.activity.clone();
        let sample = LatencySample {
            id: Uuid::new_v4(),
            endpoint: endpoint.into(),
            method: method.into(),
            duration_ms,
            status_code,
            user_id,
            error,
            created_at: now(),
        };
        tokio::spawn(async move {
            if let Err(err) = activity.append_latency(sample).await {
                tracing::warn!(error = %err, "failed to append latency sample");
            }
        });
    }

    pub async fn search_stats(&self, user_id: UserId) -> Result<SearchStats, String> {
        let now = now();
        let today = self
            .activity
            .count_activity_since(user_id, ActivityKind::MemorySearch, start_of_today(now, self.local_offset))
            .await?;
        let week = self
            .activity
            .count_activity_since(user_id, ActivityKind::MemorySearch, start_of_week(now, self.local_offset))
            .await?;
        let month = self
            .activity
            .count_activity_since(user_id, ActivityKind::MemorySearch, start_of_month(now, self.local_offset))
            .await?;
        Ok(search_stats_from_counts(today, week, month))
    }

    pub async fn recent_activity(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<RecentActivityItem>, String> {
        let entries = self.activity.recent_activity(user_id, limit).await?;
        Ok(entries
            .into_iter()
            .map(|e| to_recent_activity_item(e.kind, &e.detail, e.created_at))
            .collect())
    }

    pub async fn performance_stats(
        &self,
        open_db_connections: u32,
        uptime_pct: f64,
        cache_hit_rate: f64,
    ) -> Result<PerformanceStats, String> {
        let durations = self.activity.durations_since(start_of_today(now(), self.local_offset)).await?;
        Ok(performance_stats_from_durations(
            durations,
            open_db_connections,
            uptime_pct,
            cache_hit_rate,
        ))
    }

    /// Category breakdown derived from the live memories table, not the
    /// activity log.
    pub async fn most_used_categories(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(String, i64)>, memory_core::MemoryError> {
        let rows = self
            .memories
            .search_keyword(user_id, None, None, None, CATEGORY_TALLY_LIMIT)
            .await?;
        let mut tally: HashMap<String, i64> = HashMap::new();
        for row in rows {
            *tally.entry(row.category.to_string()).or_insert(0) += 1;
        }
        let mut counts: Vec<(String, i64)> = tally.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(counts)
    }

    /// Assembles the full per-user snapshot. `api_key_counts` and
    /// `account_created`/`last_login` come from whatever owns API-key
    /// issuance and authentication (outside this crate's scope, Non-goals).
    #[allow(clippy::too_many_arguments)]
    pub async fn user_activity_stats(
        &self,
        user_id: UserId,
        total_api_keys: i64,
        active_api_keys: i64,
        account_created: DateTime<Utc>,
        last_login: Option<DateTime<Utc>>,
        recent_limit: usize,
    ) -> Result<UserActivityStats, String> {
        let now = now();
        let api_calls_today = self
            .durations_count_since(start_of_today(now, self.local_offset))
            .await
            .unwrap_or(0);
        let api_calls_this_week = self
            .durations_count_since(start_of_week(now, self.local_offset))
            .await
            .unwrap_or(0);
        let most_used_categories = self.most_used_categories(user_id).await.unwrap_or_default();
        let recent_activity = self.recent_activity(user_id, recent_limit).await?;

        Ok(UserActivityStats {
            total_api_keys,
            active_api_keys,
            api_calls_today,
            api_calls_this_week,
            account_created,
            last_login,
            most_used_categories,
            recent_activity,
        })
    }

    async fn durations_count_since(&self, since: DateTime<Utc>) -> Result<i64, String> {
        Ok(self.activity.durations_since(since).await?.len() as i64)
    }
}

fn now() -> DateTime<Utc> {
    Utc::now()
}
