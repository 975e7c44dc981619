use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::MigrationError;

/// A single versioned step. `version` must be globally unique and
/// sortable; the runner applies migrations in ascending order (I6).
///
/// Schema-only migrations (V1) should wrap their entire body in one
/// transaction and return it atomically. Data migrations that must
/// tolerate partial failure (V2) may commit in smaller batches
/// internally — the runner still only records the version once `run`
/// returns `Ok`, so a batch migration is safe to re-run to completion
/// after a partial failure as long as each batch is idempotent.
#[async_trait]
pub trait Migration: Send + Sync {
    fn version(&self) -> i64;
    fn name(&self) -> &str;
    async fn run(&self, pool: &PgPool) -> Result<(), MigrationError>;
}
