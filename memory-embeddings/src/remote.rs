//! Remote embedding provider backed by an OpenAI-compatible HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EmbeddingError;
use crate::provider::{EmbeddingProvider, DEFAULT_DIMENSION};

/// Floor for the per-call deadline: the background embedding worker's own
/// budget, independent of whatever deadline governs the caller's request.
pub const MIN_CALL_DEADLINE: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
pub struct RemoteEmbeddingConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_retries: u32,
    pub call_deadline: Duration,
}

impl RemoteEmbeddingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_retries: 3,
            call_deadline: MIN_CALL_DEADLINE,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

pub struct RemoteEmbeddingProvider {
    client: reqwest::Client,
    config: RemoteEmbeddingConfig,
    dimension: usize,
}

impl RemoteEmbeddingProvider {
    pub fn new(config: RemoteEmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            dimension: DEFAULT_DIMENSION,
        }
    }

    /// Fire a trivial call to confirm the API key is valid. Spawned by the
    /// caller on startup; never awaited before the service starts serving.
    pub async fn validate_key(&self) {
        match self.embed_once("ping").await {
            Ok(_) => debug!("embedding provider API key validated"),
            Err(e) => warn!(error = %e, "embedding provider API key validation failed"),
        }
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let deadline = self.config.call_deadline.max(MIN_CALL_DEADLINE);
        let url = format!("{}/embeddings", self.config.base_url);
        let body = EmbeddingRequest { model: &self.config.model, input: text };

        let send = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send();

        let response = tokio::time::timeout(deadline, send)
        .await
            .map_err(|_| EmbeddingError::Retryable("request timed out".into()))?
            .map_err(|e| EmbeddingError::Retryable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status.as_u16() == 429 {
            return Err(EmbeddingError::Retryable(format!("status {status}")));
        }
        if status.is_client_error() {
            return Err(EmbeddingError::NonRetryable(format!("status {status}")));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Retryable(format!("malformed response: {e}")))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::NonRetryable("empty embedding data".into()))
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut attempt = 0;
        let mut backoff = Duration::from_secs(1);
        loop {
            match self.embed_once(text).await {
                Ok(v) => return Ok(v),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    warn!(attempt, error = %e, "embedding call failed, retrying");
                    tokio::time::sleep(backoff).await;
                    backoff *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_deadline_is_enforced() {
        let mut cfg = RemoteEmbeddingConfig::new("key");
        cfg.call_deadline = Duration::from_secs(5);
        let provider = RemoteEmbeddingProvider::new(cfg);
        assert!(provider.config.call_deadline.max(MIN_CALL_DEADLINE) >= MIN_CALL_DEADLINE);
    }
}
