use async_trait::async_trait;
use chrono::{DateTime, Utc};
use memory_core::UserId;
use sqlx::{PgPool, Row};

use crate::repository::ActivityRepository;
use crate::types::{ActivityEntry, ActivityKind, LatencySample};

pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn kind_from_str(s: &str) -> Result<ActivityKind, String> {
    match s {
        "memory_stored" => Ok(ActivityKind::MemoryStored),
        "memory_search" => Ok(ActivityKind::MemorySearch),
        "memory_deleted" => Ok(ActivityKind::MemoryDeleted),
        "api_key_created" => Ok(ActivityKind::ApiKeyCreated),
        "api_key_deleted" => Ok(ActivityKind::ApiKeyDeleted),
        "login" => Ok(ActivityKind::Login),
        other => Err(format!("unknown activity kind: {other}")),
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn append_activity(&self, entry: ActivityEntry) -> Result<(), String> {
        sqlx::query(
            "INSERT INTO activity_logs (id, user_id, kind, detail, source_ip, user_agent, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.kind.as_str())
        .bind(entry.detail)
        .bind(entry.source_ip)
        .bind(entry.user_agent)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn append_latency(&self, sample: LatencySample) -> Result<(), String> {
        // `duration_ms` is the single column of record (the source's
        // duplicate `response_time` column is dropped, not mirrored).
        sqlx::query(
            "INSERT INTO performance_metrics \
            (id, endpoint, method, duration_ms, status_code, user_id, error, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(sample.id)
        .bind(sample.endpoint)
        .bind(sample.method)
        .bind(sample.duration_ms)
        .bind(sample.status_code)
        .bind(sample.user_id)
        .bind(sample.error)
        .bind(sample.created_at)
        .execute(&self.pool)
        .await
            .map_err(|e| e.to_string())?;
        Ok(())
    }

    async fn count_activity_since(
        &self,
        user_id: UserId,
        kind: ActivityKind,
        since: DateTime<Utc>,
    ) -> Result<i64, String> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM activity_logs \
            WHERE user_id = $1 AND kind = $2 AND created_at >= $3",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(since)
        .fetch_one(&self.pool)
        .await
            .map_err(|e| e.to_string())?;
        row.try_get("n").map_err(|e| e.to_string())
    }

    async fn recent_activity(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, String> {
        let rows = sqlx::query(
            "SELECT id, user_id, kind, detail, source_ip, user_agent, created_at \
            FROM activity_logs WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
            .map_err(|e| e.to_string())?;

        rows.into_iter()
        .map(|row| {
            let kind: String = row.try_get("kind").map_err(|e| e.to_string())?;
            Ok(ActivityEntry {
                id: row.try_get("id").map_err(|e| e.to_string())?,
                user_id: row.try_get("user_id").map_err(|e| e.to_string())?,
                kind: kind_from_str(&kind)?,
                detail: row.try_get("detail").map_err(|e| e.to_string())?,
                source_ip: row.try_get("source_ip").map_err(|e| e.to_string())?,
                user_agent: row.try_get("user_agent").map_err(|e| e.to_string())?,
                created_at: row.try_get("created_at").map_err(|e| e.to_string())?,
            })
        })
        .collect()
    }

    async fn durations_since(&self, since: DateTime<Utc>) -> Result<Vec<i64>, String> {
        let rows = sqlx::query(
            "SELECT duration_ms FROM performance_metrics WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
            .map_err(|e| e.to_string())?;
        rows.into_iter()
        .map(|row| row.try_get::<i64, _>("duration_ms").map_err(|e| e.to_string()))
        .collect()
    }
}
