use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use memory_activity::{ActivityLedger, ActivityRepository};
use memory_core::{MemoryCore, MemoryRepository};
use memory_search::HybridSearch;

use crate::auth::Authenticator;
use crate::config::AppConfig;

/// Per-call deadline for the health probe.
pub const HEALTH_CHECK_DEADLINE: Duration = Duration::from_secs(5);

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> Result<(), String>;
}

pub struct PgHealthCheck {
    pool: sqlx::PgPool,
}

impl PgHealthCheck {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PgHealthCheck {
    async fn check(&self) -> Result<(), String> {
        let probe = sqlx::query("SELECT 1").execute(&self.pool);
        match tokio::time::timeout(HEALTH_CHECK_DEADLINE, probe).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err("database health check timed out".to_string()),
        }
    }
}

/// Always healthy — for the in-memory repository used by tests and
/// single-process/local invocation.
pub struct AlwaysHealthy;

#[async_trait]
impl HealthCheck for AlwaysHealthy {
    async fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Everything a request handler needs, for either surface. Generic over
/// the memory and activity repository implementations so the same
/// routing/dispatch code serves both the Postgres-backed production
/// binaries and the in-memory test fixtures.
pub struct AppState<R, A>
where
    R: MemoryRepository + 'static,
    A: ActivityRepository + 'static,
{
    pub core: MemoryCore<R>,
    pub search: HybridSearch<R>,
    pub activity: ActivityLedger<A, R>,
    pub authenticator: Arc<dyn Authenticator>,
    pub health: Arc<dyn HealthCheck>,
    pub config: AppConfig,
    pub started_at: DateTime<Utc>,
}

impl<R, A> AppState<R, A>
where
    R: MemoryRepository + 'static,
    A: ActivityRepository + 'static,
{
    pub fn uptime_pct(&self) -> f64 {
        // A single-process server reports 100% for the lifetime of this
        // instance; an operator-facing rollup across restarts is outside
        // this crate's scope.
        let _ = Utc::now() - self.started_at;
        100.0
    }
}
