use chrono::{DateTime, Utc};
use memory_core::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    MemoryStored,
    MemorySearch,
    MemoryDeleted,
    ApiKeyCreated,
    ApiKeyDeleted,
    Login,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemoryStored => "memory_stored",
            Self::MemorySearch => "memory_search",
            Self::MemoryDeleted => "memory_deleted",
            Self::ApiKeyCreated => "api_key_created",
            Self::ApiKeyDeleted => "api_key_deleted",
            Self::Login => "login",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub user_id: UserId,
    pub kind: ActivityKind,
    pub detail: serde_json::Value,
    pub source_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LatencySample {
    pub id: Uuid,
    pub endpoint: String,
    pub method: String,
    pub duration_ms: i64,
    pub status_code: i32,
    pub user_id: Option<UserId>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchStats {
    pub searches_today: i64,
    pub searches_this_week: i64,
    pub searches_this_month: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecentActivityItem {
    pub description: String,
    pub kind: ActivityKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserActivityStats {
    pub total_api_keys: i64,
    pub active_api_keys: i64,
    pub api_calls_today: i64,
    pub api_calls_this_week: i64,
    pub account_created: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub most_used_categories: Vec<(String, i64)>,
    pub recent_activity: Vec<RecentActivityItem>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub avg_duration_ms_today: f64,
    pub p95_duration_ms_today: f64,
    pub total_requests_today: i64,
    pub open_db_connections: u32,
    pub uptime_pct: f64,
    pub cache_hit_rate: f64,
}
