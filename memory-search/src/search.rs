//! Hybrid keyword + semantic search with the fallback precedence from
//! :
//!
//! ```text
//! use_semantic? and query non-empty?
//! └─ yes ── embedding provider available?
//! │ └─ yes ── query embedding ok? ── yes ── semantic path
//! │ │ └─ no ── keyword path
//! │ └─ no ── keyword path
//! └─ no ── keyword path (or list-all if query blank/"*")
//! ```

use std::sync::Arc;

use tracing::warn;

use memory_core::{Memory, MemoryError, MemoryRepository, UserId};
use memory_embeddings::EmbeddingProvider;
use memory_envelope::CryptoEnvelope;

use crate::query::{normalize, SearchQuery};

/// Which path actually served the request — callers use this to decide
/// whether to log a `memory_search` activity entry (wildcard
/// listing is not a "search").
pub struct SearchOutcome {
    pub results: Vec<Memory>,
    pub is_list_all: bool,
    pub used_semantic: bool,
}

pub struct HybridSearch<R: MemoryRepository + 'static> {
    repo: Arc<R>,
    embeddings: Option<Arc<dyn EmbeddingProvider>>,
    envelope: Option<Arc<CryptoEnvelope>>,
}

impl<R: MemoryRepository + 'static> HybridSearch<R> {
    pub fn new(
        repo: Arc<R>,
        embeddings: Option<Arc<dyn EmbeddingProvider>>,
        envelope: Option<Arc<CryptoEnvelope>>,
    ) -> Self {
        Self { repo, embeddings, envelope }
    }

    fn decrypt(&self, memory: Memory) -> Memory {
        let content = memory_core_reveal(self.envelope.as_ref(), &memory);
        Memory { content, ..memory }
    }

    pub async fn search(
        &self,
        user_id: UserId,
        query: &SearchQuery,
    ) -> Result<SearchOutcome, MemoryError> {
        let norm = normalize(query);

        if norm.is_list_all {
            let rows = self
                .repo
                .search_keyword(user_id, None, query.category, query.memory_type, norm.limit)
                .await?;
            let results = rows.into_iter().map(|m| self.decrypt(m)).collect();
            return Ok(SearchOutcome { results, is_list_all: true, used_semantic: false });
        }

        if norm.use_semantic {
            if let Some(embeddings) = &self.embeddings {
                match embeddings.embed(norm.keyword.as_deref().unwrap_or_default()).await {
                    Ok(query_embedding) => {
                        // Cold start: no row for this user has an embedding yet.
                        // Returning keyword hits here would look like semantic
                        // matches, so we return empty instead.
                        if !self.repo.has_any_embedding(user_id).await? {
                            return Ok(SearchOutcome {
                                results: Vec::new(),
                                is_list_all: false,
                                used_semantic: true,
                            });
                        }

                        let rows = self
                            .repo
                            .search_semantic(
                            user_id,
                            &query_embedding,
                            query.category,
                            query.memory_type,
                            norm.limit,
                        )
                        .await?;
                        let results = rows.into_iter().map(|m| self.decrypt(m)).collect();
                        return Ok(SearchOutcome {
                            results,
                            is_list_all: false,
                            used_semantic: true,
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "query embedding failed, falling back to keyword search");
                    }
                }
            }
        }

        let rows = self
            .repo
            .search_keyword(
            user_id,
            norm.keyword.as_deref(),
            query.category,
            query.memory_type,
            norm.limit,
        )
        .await?;
        let results = rows.into_iter().map(|m| self.decrypt(m)).collect();
        Ok(SearchOutcome { results, is_list_all: false, used_semantic: false })
    }
}

/// Decryption mirrors `memory_core`'s own best-effort policy: failure
/// yields the sentinel plus a logged warning rather than an error.
fn memory_core_reveal(envelope: Option<&Arc<CryptoEnvelope>>, memory: &Memory) -> String {
    if !memory.is_encrypted {
        return memory.content.clone();
    }
    let Some(env) = envelope else {
        return memory_core::ENCRYPTED_SENTINEL.to_string();
    };
    let Some(json) = &memory.encrypted_content else {
        return memory_core::ENCRYPTED_SENTINEL.to_string();
    };
    let parsed: Result<memory_envelope::Envelope, _> = serde_json::from_value(json.clone());
    match parsed.ok().and_then(|e| env.decrypt(&e).ok()) {
        Some(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| {
            memory_core::ENCRYPTED_SENTINEL.to_string()
        }),
        None => {
            warn!("failed to decrypt search result content");
            memory_core::ENCRYPTED_SENTINEL.to_string()
        }
    }
}
