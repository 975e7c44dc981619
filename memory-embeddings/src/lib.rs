//! # memory-embeddings
//!
//! Maps text to fixed-dimension unit vectors behind a single
//! [`EmbeddingProvider`] interface, with two variants: a remote
//! OpenAI-compatible HTTP API, and a deterministic mock for tests and
//! offline operation.

pub mod error;
mod mock;
mod provider;
mod remote;
mod similarity;

pub use error::EmbeddingError;
pub use mock::MockEmbeddingProvider;
pub use provider::{EmbeddingProvider, DEFAULT_DIMENSION};
pub use remote::{RemoteEmbeddingConfig, RemoteEmbeddingProvider, MIN_CALL_DEADLINE};
pub use similarity::{cosine_similarity, l2_normalize};
