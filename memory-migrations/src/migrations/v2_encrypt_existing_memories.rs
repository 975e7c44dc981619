//! V2 — encrypt any pre-existing plaintext rows once an encryption
//! envelope becomes configured . Intentionally *not* atomic across
//! rows: each row is encrypted and committed independently, so a crash
//! midway leaves a resumable, idempotent state (the `WHERE` clause only
//! ever selects rows that still need work).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{info, warn};
use uuid::Uuid;

use memory_core::ENCRYPTED_SENTINEL;
use memory_envelope::CryptoEnvelope;

use crate::error::MigrationError;
use crate::migration::Migration;

const BATCH_SIZE: i64 = 100;

pub struct EncryptExistingMemories {
    envelope: Option<Arc<CryptoEnvelope>>,
}

impl EncryptExistingMemories {
    pub fn new(envelope: Option<Arc<CryptoEnvelope>>) -> Self {
        Self { envelope }
    }
}

#[async_trait]
impl Migration for EncryptExistingMemories {
    fn version(&self) -> i64 {
        2
    }

    fn name(&self) -> &str {
        "encrypt_existing_memories"
    }

    async fn run(&self, pool: &PgPool) -> Result<(), MigrationError> {
        let Some(envelope) = &self.envelope else {
            info!("encryption not configured, V2 is a no-op");
            return Ok(());
        };

        let mut total_encrypted = 0u64;
        loop {
            let rows = sqlx::query(
                "SELECT id, content FROM memories \
                WHERE (is_encrypted = false OR is_encrypted IS NULL) AND content <> $1 \
                LIMIT $2",
            )
            .bind(ENCRYPTED_SENTINEL)
            .bind(BATCH_SIZE)
            .fetch_all(pool)
            .await
                .map_err(|e| fail(self, e))?;

            if rows.is_empty() {
                break;
            }

            let batch_len = rows.len();
            for row in rows {
                let id: Uuid = row.try_get("id").map_err(|e| fail(self, e))?;
                let content: String = row.try_get("content").map_err(|e| fail(self, e))?;

                if content.is_empty() {
                    continue;
                }

                let sealed = match envelope.encrypt(content.as_bytes()) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(memory_id = %id, error = %e, "skipping row, failed to encrypt");
                        continue;
                    }
                };
                let json = serde_json::to_value(sealed).expect("envelope always serializes");

                let updated = sqlx::query(
                    "UPDATE memories SET encrypted_content = $1, is_encrypted = true, \
                    content = $2 WHERE id = $3",
                )
                .bind(&json)
                .bind(ENCRYPTED_SENTINEL)
                .bind(id)
                .execute(pool)
                .await;

                match updated {
                    Ok(_) => total_encrypted += 1,
                    Err(e) => warn!(memory_id = %id, error = %e, "skipping row, failed to persist"),
                }
            }

            if batch_len < BATCH_SIZE as usize {
                break;
            }
        }

        info!(count = total_encrypted, "encrypted pre-existing memories");
        Ok(())
    }
}

fn fail(migration: &EncryptExistingMemories, source: sqlx::Error) -> MigrationError {
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
        let m = EncryptExistingMemories::new(None);
        assert_eq!(m.version(), 2);
        assert_eq!(m.name(), "encrypt_existing_memories");
    }
}
