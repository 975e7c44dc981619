use chrono::{DateTime, Utc};

/// A single row of `schema_migrations`.
#[derive(Clone, Debug)]
pub struct MigrationRecord {
    pub version: i64,
    pub name: String,
    pub applied_at: DateTime<Utc>,
}
