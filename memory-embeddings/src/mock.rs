//! Deterministic mock provider: SHA-256 seeds a PRNG, a smoothing pass
//! removes the raw hash's blockiness, then the vector is L2-normalized.
//! Same input always yields the same output.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::EmbeddingError;
use crate::provider::{EmbeddingProvider, DEFAULT_DIMENSION};
use crate::similarity::l2_normalize;

pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self { dimension: DEFAULT_DIMENSION }
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }

    /// Pure, synchronous variant used directly by tests and by the
    /// detector's dedup-key heuristics where no async context exists.
    pub fn embed_sync(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let digest = Sha256::digest(text.as_bytes());
        let mut state: u64 = u64::from_le_bytes(digest[0..8].try_into().unwrap());

        let mut raw = Vec::with_capacity(self.dimension);
        for _ in 0..self.dimension {
            // splitmix64
            state = state.wrapping_add(0x9E3779B97F4A7C15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
            z ^= z >> 31;
            let unit = (z as f64) / (u64::MAX as f64);
            raw.push((unit * 2.0 - 1.0) as f32);
        }

        // Nonlinear smoothing: blend each element with its neighbors and
        // squash through tanh so the raw PRNG output isn't a pure i.i.d.
        // lattice (keeps the cosine geometry from being pathological).
        let mut smoothed = vec![0.0f32; self.dimension];
        for i in 0..self.dimension {
            let prev = raw[(i + self.dimension - 1) % self.dimension];
            let next = raw[(i + 1) % self.dimension];
            let blended = 0.5 * raw[i] + 0.25 * prev + 0.25 * next;
            smoothed[i] = blended.tanh();
        }

        l2_normalize(&mut smoothed);
        Ok(smoothed)
    }
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed_sync(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_rejected() {
        let p = MockEmbeddingProvider::new();
        assert_eq!(p.embed_sync(""), Err(EmbeddingError::EmptyInput));
    }

    #[test]
    fn same_input_same_output() {
        let p = MockEmbeddingProvider::new();
        let a = p.embed_sync("hello world").unwrap();
        let b = p.embed_sync("hello world").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_input_different_output() {
        let p = MockEmbeddingProvider::new();
        let a = p.embed_sync("hello").unwrap();
        let b = p.embed_sync("goodbye").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn output_is_unit_length() {
        let p = MockEmbeddingProvider::new();
        let v = p.embed_sync("some memory content").unwrap();
        assert_eq!(v.len(), DEFAULT_DIMENSION);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3, "norm was {norm}");
    }

    #[tokio::test]
    async fn async_embed_matches_sync() {
        let p = MockEmbeddingProvider::new();
        let sync = p.embed_sync("async vs sync").unwrap();
        let via_trait = p.embed("async vs sync").await.unwrap();
        assert_eq!(sync, via_trait);
    }
}
