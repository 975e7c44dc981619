//! Error taxonomy for the migration runner (: Database kind,
//! wrapped with the operation/migration name that was in flight).

use std::fmt;

#[derive(Debug)]
pub enum MigrationError {
    /// A migration's function returned an error; the whole run aborts.
    Failed { version: i64, name: String, source: String },
    /// The `schema_migrations` bookkeeping table itself could not be
    /// read or written.
    Bookkeeping(String),
}

impl fmt::Display for MigrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { version, name, source } => {
                write!(f, "migration {version} ({name}) failed: {source}")
            }
            Self::Bookkeeping(msg) => write!(f, "schema_migrations bookkeeping failed: {msg}"),
        }
    }
}

impl std::error::Error for MigrationError {}

impl From<sqlx::Error> for MigrationError {
    fn from(e: sqlx::Error) -> Self {
        Self::Bookkeeping(e.to_string())
    }
}
