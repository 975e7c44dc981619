//! # memory-migrations
//!
//! Versioned, transactional, idempotent schema and data migrations
//! , including the two canonical migrations that add and then
//! populate the envelope-encryption columns on `memories`.
//!
//! Migrations are registered against a [`MigrationRunner`], which sorts
//! by version and applies each unapplied one in turn, recording it in
//! `schema_migrations` only once it returns successfully (I6). A failed
//! migration aborts the whole run; nothing later is applied.

pub mod error;
mod migration;
pub mod migrations;
mod record;
mod runner;

pub use error::MigrationError;
pub use migration::Migration;
pub use migrations::{AddEncryptionFields, EncryptExistingMemories};
pub use record::MigrationRecord;
pub use runner::MigrationRunner;

/// Build a runner with the two canonical core migrations already
/// registered, in the order callers almost always want them applied.
pub fn core_runner(
    pool: sqlx::PgPool,
    envelope: Option<std::sync::Arc<memory_envelope::CryptoEnvelope>>,
) -> MigrationRunner {
    let mut runner = MigrationRunner::new(pool);
    runner.register(Box::new(AddEncryptionFields));
    runner.register(Box::new(EncryptExistingMemories::new(envelope)));
    runner
}
