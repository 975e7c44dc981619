//! Memory Core: store-or-update, explicit update, delete, quota, and async
//! embedding maintenance.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use memory_embeddings::EmbeddingProvider;
use memory_envelope::CryptoEnvelope;

use crate::config::MemoryCoreConfig;
use crate::encryption::{reveal_content, seal_content};
use crate::error::MemoryError;
use crate::repository::MemoryRepository;
use crate::types::{Memory, StoreInput, UpdateInput, UserId};

pub struct MemoryCore<R: MemoryRepository + 'static> {
    repo: Arc<R>,
    embeddings: Arc<dyn EmbeddingProvider>,
    envelope: Option<Arc<CryptoEnvelope>>,
    config: MemoryCoreConfig,
}

impl<R: MemoryRepository + 'static> Clone for MemoryCore<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            embeddings: self.embeddings.clone(),
            envelope: self.envelope.clone(),
            config: self.config.clone(),
        }
    }
}

impl<R: MemoryRepository + 'static> MemoryCore<R> {
    pub fn new(
        repo: Arc<R>,
        embeddings: Arc<dyn EmbeddingProvider>,
        envelope: Option<Arc<CryptoEnvelope>>,
        config: MemoryCoreConfig,
    ) -> Self {
        Self { repo, embeddings, envelope, config }
    }

    fn decrypted(&self, memory: Memory) -> Memory {
        let content = reveal_content(
            self.envelope.as_ref(),
            memory.is_encrypted,
            memory.encrypted_content.as_ref(),
            &memory.content,
        );
        Memory { content, ..memory }
    }

    /// store-or-update.
    pub async fn store_or_update(
        &self,
        user_id: UserId,
        input: StoreInput,
    ) -> Result<Memory, MemoryError> {
        if input.content.is_empty() {
            return Err(MemoryError::validation("content", "must not be empty"));
        }

        let existing = match input.update_key.as_deref() {
            Some(key) if !key.is_empty() => self.repo.find_by_update_key(user_id, key).await?,
            _ => None,
        };
        let existing = match existing {
            Some(m) => Some(m),
            None => self.repo.find_by_exact_content(user_id, &input.content).await?,
        };

        let (content_for_storage, encrypted_content, is_encrypted) =
            seal_content(self.envelope.as_ref(), &input.content);

        let now = Utc::now();
        let plaintext = input.content.clone();

        let row = if let Some(mut memory) = existing {
            memory.category = input.category;
            memory.memory_type = input.memory_type;
            memory.priority = input.priority;
            memory.update_key = input.update_key;
            memory.tags = input.tags;
            memory.metadata = input.metadata;
            memory.content = content_for_storage;
            memory.encrypted_content = encrypted_content;
            memory.is_encrypted = is_encrypted;
            memory.updated_at = now;
            self.repo.update_fields(memory).await?
        } else {
            let memory = Memory {
                id: Uuid::new_v4(),
                user_id,
                memory_type: input.memory_type,
                category: input.category,
                content: content_for_storage,
                priority: input.priority,
                update_key: input.update_key,
                tags: input.tags,
                metadata: input.metadata,
                embedding: None,
                encrypted_content,
                is_encrypted,
                created_at: now,
                updated_at: now,
            };
            let inserted = self.repo.insert(memory).await?;
            self.enforce_quota(user_id).await;
            inserted
        };

        self.schedule_embedding_refresh(row.id, plaintext);

        Ok(self.decrypted(row))
    }

    /// explicit update by id.
    pub async fn update_by_id(
        &self,
        user_id: UserId,
        id: Uuid,
        patch: UpdateInput,
    ) -> Result<Memory, MemoryError> {
        let mut memory = self.repo.get_by_id(user_id, id).await?.ok_or(MemoryError::NotFound)?;

        let mut new_plaintext = None;
        if let Some(content) = &patch.content {
            if !content.is_empty() {
                let (stored, envelope_json, is_encrypted) =
                    seal_content(self.envelope.as_ref(), content);
                memory.content = stored;
                memory.encrypted_content = envelope_json;
                memory.is_encrypted = is_encrypted;
                new_plaintext = Some(content.clone());
            }
        }
        if let Some(category) = patch.category {
            memory.category = category;
        }
        if let Some(memory_type) = patch.memory_type {
            memory.memory_type = memory_type;
        }
        if let Some(priority) = patch.priority {
            memory.priority = priority;
        }
        if let Some(tags) = patch.tags {
            memory.tags = tags;
        }
        if let Some(metadata) = patch.metadata {
            memory.metadata = metadata;
        }
        memory.updated_at = Utc::now();

        let saved = self.repo.update_fields(memory).await?;

        if let Some(plaintext) = new_plaintext {
            self.schedule_embedding_refresh(saved.id, plaintext);
        }

        Ok(self.decrypted(saved))
    }

    pub async fn delete(&self, user_id: UserId, id: Uuid) -> Result<(), MemoryError> {
        let deleted = self.repo.delete(user_id, id).await?;
        if deleted {
            Ok(())
        } else {
            Err(MemoryError::NotFound)
        }
    }

    pub async fn get_by_id(&self, user_id: UserId, id: Uuid) -> Result<Memory, MemoryError> {
        let memory = self.repo.get_by_id(user_id, id).await?.ok_or(MemoryError::NotFound)?;
        Ok(self.decrypted(memory))
    }

    pub async fn count(&self, user_id: UserId) -> Result<i64, MemoryError> {
        self.repo.count_for_user(user_id).await
    }

    /// Daily memory-creation counts over the last `days` days. Read from
    /// `memories` rather than the activity log, so it stays correct across
    /// log truncation.
    pub async fn growth(
        &self,
        user_id: UserId,
        days: i64,
    ) -> Result<Vec<crate::types::GrowthPoint>, MemoryError> {
        let since = Utc::now() - chrono::Duration::days(days.max(1));
        self.repo.daily_growth(user_id, since).await
    }

    /// advisory quota enforcement. A failure to evict does not
    /// fail the store; it is logged and the method returns regardless.
    async fn enforce_quota(&self, user_id: UserId) {
        let count = match self.repo.count_for_user(user_id).await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "quota check failed, skipping eviction");
                return;
            }
        };

        let over = count - self.config.max_memories;
        if over <= 0 {
            return;
        }

        let victims = match self.repo.oldest_for_user(user_id, over).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "quota eviction lookup failed");
                return;
            }
        };

        for victim in victims {
            if let Err(e) = self.repo.delete(user_id, victim.id).await {
                warn!(error = %e, memory_id = %victim.id, "quota eviction failed for one row, continuing");
            }
        }
    }

    /// spawn-and-forget embedding refresh, decoupled from the
    /// inbound request's cancellation and deadline.
    fn schedule_embedding_refresh(&self, id: Uuid, plaintext: String) {
        let repo = self.repo.clone();
        let embeddings = self.embeddings.clone();
        let db_deadline = self.config.db_deadline;

        tokio::spawn(async move {
            let vector = match embeddings.embed(&plaintext).await {
                Ok(v) => v,
                Err(e) => {
                    info!(memory_id = %id, error = %e, "embedding refresh failed, memory remains keyword-searchable only");
                    return;
                }
            };

            let write = tokio::time::timeout(db_deadline, repo.update_embedding(id, Some(vector)));
            if write.await.is_err() {
                error!(memory_id = %id, "embedding write timed out");
            }
        });
    }
}
