use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::UserId;

use crate::types::{ActivityEntry, ActivityKind, LatencySample};

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    async fn append_activity(&self, entry: ActivityEntry) -> Result<(), String>;
    async fn append_latency(&self, sample: LatencySample) -> Result<(), String>;

    async fn count_activity_since(
        &self,
        user_id: UserId,
        kind: ActivityKind,
        since: DateTime<Utc>,
    ) -> Result<i64, String>;

    async fn recent_activity(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, String>;

    async fn durations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<i64>, String>;
}
