//! Ordered, once-only migration runner.

use sqlx::{PgPool, Row};
use tracing::{error, info};

use crate::error::MigrationError;
use crate::migration::Migration;
use crate::record::MigrationRecord;

pub struct MigrationRunner {
    pool: PgPool,
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRunner {
    pub fn new(pool: PgPool) -> Self {
        Self { pool, migrations: Vec::new() }
    }

    /// Register a migration. Order of registration does not matter — the
    /// runner sorts by `version` before applying.
    pub fn register(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    async fn ensure_bookkeeping_table(&self) -> Result<(), MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (\
            version BIGINT PRIMARY KEY, \
            name TEXT NOT NULL, \
            applied_at TIMESTAMPTZ NOT NULL DEFAULT now() \
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn applied_versions(&self) -> Result<Vec<i64>, MigrationError> {
        let rows = sqlx::query("SELECT version FROM schema_migrations")
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(|r| r.try_get::<i64, _>("version").map_err(MigrationError::from)).collect()
    }

    pub async fn applied_records(&self) -> Result<Vec<MigrationRecord>, MigrationError> {
        self.ensure_bookkeeping_table().await?;
        let rows = sqlx::query("SELECT version, name, applied_at FROM schema_migrations ORDER BY version ASC")
        .fetch_all(&self.pool)
        .await?;
        rows.iter()
        .map(|r| {
            Ok(MigrationRecord {
                version: r.try_get("version")?,
                name: r.try_get("name")?,
                applied_at: r.try_get("applied_at")?,
            })
        })
        .collect()
    }

    /// Run every registered, unapplied migration in ascending version
    /// order. Returns the versions actually applied this run. A failure
    /// aborts the whole run without applying any later migration (I6).
    pub async fn run(&mut self) -> Result<Vec<i64>, MigrationError> {
        self.ensure_bookkeeping_table().await?;

        self.migrations.sort_by_key(|m| m.version());
        let applied = self.applied_versions().await?;

        let mut newly_applied = Vec::new();
        for migration in &self.migrations {
            if applied.contains(&migration.version()) {
                continue;
            }

            info!(version = migration.version(), name = migration.name(), "applying migration");
            if let Err(e) = migration.run(&self.pool).await {
                error!(
                    version = migration.version(),
                    name = migration.name(),
                    error = %e,
                    "migration failed, aborting run"
                );
                return Err(MigrationError::Failed {
                    version: migration.version(),
                    name: migration.name().to_string(),
                    source: e.to_string(),
                });
            }

            sqlx::query("INSERT INTO schema_migrations (version, name) VALUES ($1, $2)")
            .bind(migration.version())
            .bind(migration.name())
            .execute(&self.pool)
            .await?;
            newly_applied.push(migration.version());
        }

        Ok(newly_applied)
    }
}
