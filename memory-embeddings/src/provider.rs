//! The `EmbeddingProvider` trait both variants implement.

use async_trait::async_trait;

use crate::error::EmbeddingError;

pub const DEFAULT_DIMENSION: usize = 1536;

/// Maps text to a fixed-dimension unit vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Vector dimension this provider produces.
    fn dimension(&self) -> usize;

    /// Embed `text`, enforcing whatever deadline/retry policy the
    /// implementation requires internally.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}
