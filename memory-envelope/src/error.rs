//! Error types for the crypto envelope.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyInput;

impl fmt::Display for EmptyInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plaintext must not be empty")
    }
}
impl std::error::Error for EmptyInput {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticationFailed;

impl fmt::Display for AuthenticationFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "envelope authentication failed")
    }
}
impl std::error::Error for AuthenticationFailed {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMasterKey(pub String);

impl fmt::Display for InvalidMasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid master key: {}", self.0)
    }
}
impl std::error::Error for InvalidMasterKey {}

/// Errors surfaced by `CryptoEnvelope::encrypt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptError {
    EmptyInput,
    /// Underlying AEAD / RNG failure — never expected in practice.
    Internal,
}

impl fmt::Display for EncryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInput => EmptyInput.fmt(f),
            Self::Internal => write!(f, "internal encryption failure"),
        }
    }
}
impl std::error::Error for EncryptError {}

/// Errors surfaced by `CryptoEnvelope::decrypt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptError {
    AuthenticationFailed,
    MalformedEnvelope,
}

impl fmt::Display for DecryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthenticationFailed => AuthenticationFailed.fmt(f),
            Self::MalformedEnvelope => write!(f, "envelope is not well-formed"),
        }
    }
}
impl std::error::Error for DecryptError {}
