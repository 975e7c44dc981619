use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::UserId;

use crate::repository::ActivityRepository;
use crate::types::{ActivityEntry, ActivityKind, LatencySample};

#[derive(Default)]
pub struct InMemoryActivityRepository {
    activity: RwLock<Vec<ActivityEntry>>,
    latency: RwLock<Vec<LatencySample>>,
}

impl InMemoryActivityRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn append_activity(&self, entry: ActivityEntry) -> Result<(), String> {
        self.activity.write().unwrap().push(entry);
        Ok(())
    }

    async fn append_latency(&self, sample: LatencySample) -> Result<(), String> {
        self.latency.write().unwrap().push(sample);
        Ok(())
    }

    async fn count_activity_since(
        &self,
        user_id: UserId,
        kind: ActivityKind,
        since: DateTime<Utc>,
    ) -> Result<i64, String> {
        let activity = self.activity.read().unwrap();
        Ok(activity
            .iter()
            .filter(|e| e.user_id == user_id && e.kind == kind && e.created_at >= since)
            .count() as i64)
    }

    async fn recent_activity(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, String> {
        let activity = self.activity.read().unwrap();
        let mut mine: Vec<ActivityEntry> =
            activity.iter().filter(|e| e.user_id == user_id).cloned().collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        mine.truncate(limit);
        Ok(mine)
    }

    async fn durations_since(&self, since: DateTime<Utc>) -> Result<Vec<i64>, String> {
        let latency = self.latency.read().unwrap();
        Ok(latency
            .iter()
            .filter(|s| s.created_at >= since)
            .map(|s| s.duration_ms)
            .collect())
    }
}
