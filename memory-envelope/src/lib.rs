//! # memory-envelope
//!
//! Per-record field-level authenticated encryption with a wrapped data key.
//! The master key is supplied once at construction and never written to
//! storage; every encrypt call draws a fresh per-record data key so that
//! key rotation can re-wrap without re-encrypting content.
//!
//! ```
//! use memory_envelope::CryptoEnvelope;
//!
//! let key_b64 = CryptoEnvelope::generate_master_key();
//! let envelope = CryptoEnvelope::from_base64(&key_b64).unwrap();
//!
//! let sealed = envelope.encrypt(b"remember this").unwrap();
//! let plaintext = envelope.decrypt(&sealed).unwrap();
//! assert_eq!(plaintext, b"remember this");
//! ```

mod aead;
mod envelope;
mod kdf;

pub mod error;

pub use envelope::{CryptoEnvelope, Envelope};
pub use error::{AuthenticationFailed, DecryptError, EmptyInput, EncryptError, InvalidMasterKey};
