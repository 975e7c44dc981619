//! Transparent encryption helpers used by every Memory Core write/read path.

use std::sync::Arc;

use memory_envelope::CryptoEnvelope;
use tracing::warn;

use crate::types::ENCRYPTED_SENTINEL;

/// Encrypt `plaintext` if an envelope is configured. Returns the content
/// to persist (the sentinel when encrypted, the plaintext otherwise), the
/// envelope JSON to store, and the `is_encrypted` flag.
pub fn seal_content(
    envelope: Option<&Arc<CryptoEnvelope>>,
    plaintext: &str,
) -> (String, Option<serde_json::Value>, bool) {
    match envelope {
        Some(env) => match env.encrypt(plaintext.as_bytes()) {
            Ok(sealed) => {
                let json = serde_json::to_value(sealed)
                .expect("Envelope always serializes to a JSON object");
                (ENCRYPTED_SENTINEL.to_string(), Some(json), true)
            }
            Err(e) => {
                warn!(error = %e, "failed to encrypt memory content, storing in plaintext");
                (plaintext.to_string(), None, false)
            }
        },
        None => (plaintext.to_string(), None, false),
    }
}

/// Decrypt a row's `encrypted_content` back into plaintext for the
/// response. Failure is non-fatal: the sentinel is returned and a warning
/// is logged. If the row is encrypted but no envelope is configured, the
/// caller receives the sentinel too (I2 still holds on disk).
pub fn reveal_content(
    envelope: Option<&Arc<CryptoEnvelope>>,
    is_encrypted: bool,
    encrypted_content: Option<&serde_json::Value>,
    stored_content: &str,
) -> String {
    if !is_encrypted {
        return stored_content.to_string();
    }

    let (Some(env), Some(json)) = (envelope, encrypted_content) else {
        return ENCRYPTED_SENTINEL.to_string();
    };

    let parsed: Result<memory_envelope::Envelope, _> = serde_json::from_value(json.clone());
    match parsed {
        Ok(sealed) => match env.decrypt(&sealed) {
            Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| {
                warn!("decrypted memory content was not valid UTF-8");
                ENCRYPTED_SENTINEL.to_string()
            }),
            Err(e) => {
                warn!(error = %e, "failed to decrypt memory content");
                ENCRYPTED_SENTINEL.to_string()
            }
        },
        Err(e) => {
            warn!(error = %e, "stored envelope was malformed");
            ENCRYPTED_SENTINEL.to_string()
        }
    }
}
