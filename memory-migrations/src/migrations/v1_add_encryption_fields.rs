//! V1 — add the `encrypted_content` / `is_encrypted` columns used by
//! transparent envelope encryption . Schema-only, so the whole
//! body runs as one transaction.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::MigrationError;
use crate::migration::Migration;

pub struct AddEncryptionFields;

#[async_trait]
impl Migration for AddEncryptionFields {
    fn version(&self) -> i64 {
        1
    }

    fn name(&self) -> &str {
        "add_encryption_fields"
    }

    async fn run(&self, pool: &PgPool) -> Result<(), MigrationError> {
        let mut tx = pool.begin().await.map_err(|e| fail(self, e))?;

        sqlx::query("ALTER TABLE memories ADD COLUMN IF NOT EXISTS encrypted_content JSONB")
        .execute(&mut *tx)
        .await
            .map_err(|e| fail(self, e))?;

        sqlx::query(
            "ALTER TABLE memories ADD COLUMN IF NOT EXISTS is_encrypted BOOLEAN NOT NULL DEFAULT false",
        )
        .execute(&mut *tx)
        .await
            .map_err(|e| fail(self, e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_memories_is_encrypted ON memories (is_encrypted)",
        )
        .execute(&mut *tx)
        .await
            .map_err(|e| fail(self, e))?;

        tx.commit().await.map_err(|e| fail(self, e))?;
        Ok(())
    }
}

fn fail(migration: &AddEncryptionFields, source: sqlx::Error) -> MigrationError {
    MigrationError::Failed {
        version: migration.version(),
        name: migration.name().to_string(),
        source: source.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_and_name_are_stable() {
        let m = AddEncryptionFields;
        assert_eq!(m.version(), 1);
        assert_eq!(m.name(), "add_encryption_fields");
    }
}
