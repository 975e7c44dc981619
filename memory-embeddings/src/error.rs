//! Error types for embedding providers.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyInput;

impl fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "input text must not be empty")
    }
}
impl std::error::Error for EmptyInput {}

/// Whether a failed embedding call is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingError {
    EmptyInput,
    /// Network failure, timeout, or 5xx — safe to retry with backoff.
    Retryable(String),
    /// Authentication failure or non-429 4xx — retrying will not help.
    NonRetryable(String),
}

impl EmbeddingError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable(_))
    }
}

impl fmt::Display for EmbeddingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => EmptyInput.fmt(f),
            Self::Retryable(msg) => write!(f, "embedding call failed (retryable): {}", msg),
            Self::NonRetryable(msg) => write!(f, "embedding call failed: {}", msg),
        }
    }
}
impl std::error::Error for EmbeddingError {}
