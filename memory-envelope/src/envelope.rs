//! Per-record envelope encryption with a master-key wrap.
//!
//! Each call to [`CryptoEnvelope::encrypt`] draws a fresh 32-byte data key,
//! encrypts the plaintext under it, then wraps the data key under the
//! master key. The master key is held in memory for the lifetime of the
//! `CryptoEnvelope` and is never written to storage; the per-record data
//! key is zeroed immediately after use.

use base64::{engine::general_purpose::STANDARD, Engine};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::aead::{aead_open, aead_seal, nonce};
use crate::error::{DecryptError, EncryptError, InvalidMasterKey};

/// The four-field record produced by encryption. All fields are base64.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub ciphertext: String,
    pub wrapped_key: String,
    pub nonce: String,
    pub key_nonce: String,
}

impl Envelope {
    fn decode_field(s: &str) -> Result<Vec<u8>, DecryptError> {
        STANDARD.decode(s).map_err(|_| DecryptError::MalformedEnvelope)
    }
}

/// Holds the master key and performs encrypt/decrypt/subkey derivation.
pub struct CryptoEnvelope {
    master_key: Zeroizing<[u8; 32]>,
}

impl CryptoEnvelope {
    /// Construct from a raw 32-byte master key.
    pub fn new(master_key: [u8; 32]) -> Self {
        Self { master_key: Zeroizing::new(master_key) }
    }

    /// Construct from a base64-encoded master key. Rejects anything that
    /// does not decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, InvalidMasterKey> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| InvalidMasterKey(e.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| InvalidMasterKey(format!("expected 32 bytes, got {}", v.len())))?;
        Ok(Self::new(arr))
    }

    /// Generate a fresh random master key, base64-encoded.
    pub fn generate_master_key() -> String {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        STANDARD.encode(key)
    }

    /// Derive a 32-byte subkey from the master key, salt, and info.
    pub fn derive_subkey(&self, salt: &[u8], info: &[u8]) -> [u8; 32] {
        crate::kdf::derive_subkey(&self.master_key, salt, info)
    }

    /// Encrypt `plaintext` under a fresh per-record data key, then wrap
    /// that data key under the master key.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Envelope, EncryptError> {
        if plaintext.is_empty() {
            return Err(EncryptError::EmptyInput);
        }

        let mut data_key = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut *data_key);

        let data_nonce = nonce()?;
        let ciphertext = aead_seal(&data_key, &data_nonce, plaintext, b"")?;

        let key_nonce = nonce()?;
        let wrapped_key = aead_seal(&self.master_key, &key_nonce, &data_key[..], b"")?;

        // data_key is zeroed on drop (Zeroizing).
        Ok(Envelope {
            ciphertext: STANDARD.encode(ciphertext),
            wrapped_key: STANDARD.encode(wrapped_key),
            nonce: STANDARD.encode(data_nonce),
            key_nonce: STANDARD.encode(key_nonce),
        })
    }

    /// Decrypt an envelope back into plaintext. Fails with
    /// `AuthenticationFailed` if any field has been tampered with.
    pub fn decrypt(&self, envelope: &Envelope) -> Result<Vec<u8>, DecryptError> {
        let ciphertext = Envelope::decode_field(&envelope.ciphertext)?;
        let wrapped_key = Envelope::decode_field(&envelope.wrapped_key)?;
        let data_nonce: [u8; 12] = Envelope::decode_field(&envelope.nonce)?
            .try_into()
            .map_err(|_| DecryptError::MalformedEnvelope)?;
        let key_nonce: [u8; 12] = Envelope::decode_field(&envelope.key_nonce)?
            .try_into()
            .map_err(|_| DecryptError::MalformedEnvelope)?;

        let data_key_bytes = aead_open(&self.master_key, &key_nonce, &wrapped_key, b"")?;
        let data_key: Zeroizing<[u8; 32]> = Zeroizing::new(
            data_key_bytes
                .try_into()
                .map_err(|_| DecryptError::AuthenticationFailed)?,
        );

        aead_open(&data_key, &data_nonce, &ciphertext, b"")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_envelope() -> CryptoEnvelope {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        CryptoEnvelope::new(key)
    }

    #[test]
    fn round_trip() {
        let env = test_envelope();
        let sealed = env.encrypt(b"hello world").unwrap();
        let opened = env.decrypt(&sealed).unwrap();
        assert_eq!(opened, b"hello world");
    }

    #[test]
    fn empty_plaintext_rejected() {
        let env = test_envelope();
        assert_eq!(env.encrypt(b""), Err(EncryptError::EmptyInput));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let env = test_envelope();
        let mut sealed = env.encrypt(b"secret").unwrap();
        let mut raw = STANDARD.decode(&sealed.ciphertext).unwrap();
        raw[0] ^= 0xFF;
        sealed.ciphertext = STANDARD.encode(raw);
        assert_eq!(env.decrypt(&sealed), Err(DecryptError::AuthenticationFailed));
    }

    #[test]
    fn tampered_wrapped_key_fails() {
        let env = test_envelope();
        let mut sealed = env.encrypt(b"secret").unwrap();
        let mut raw = STANDARD.decode(&sealed.wrapped_key).unwrap();
        raw[0] ^= 0xFF;
        sealed.wrapped_key = STANDARD.encode(raw);
        assert_eq!(env.decrypt(&sealed), Err(DecryptError::AuthenticationFailed));
    }

    #[test]
    fn generated_master_key_round_trips() {
        let key_b64 = CryptoEnvelope::generate_master_key();
        let env = CryptoEnvelope::from_base64(&key_b64).unwrap();
        let sealed = env.encrypt(b"data").unwrap();
        assert_eq!(env.decrypt(&sealed).unwrap(), b"data");
    }

    #[test]
    fn wrong_length_master_key_rejected() {
        let err = CryptoEnvelope::from_base64(&STANDARD.encode(b"too short"));
        assert!(err.is_err());
    }

    #[test]
    fn derive_subkey_is_deterministic() {
        let env = test_envelope();
        let a = env.derive_subkey(b"salt", b"info");
        let b = env.derive_subkey(b"salt", b"info");
        assert_eq!(a, b);
        let c = env.derive_subkey(b"salt", b"other-info");
        assert_ne!(a, c);
    }

    proptest::proptest! {
        #[test]
        fn round_trip_arbitrary_plaintext(data in proptest::collection::vec(proptest::num::u8::ANY, 1..256)) {
            let env = test_envelope();
            let sealed = env.encrypt(&data).unwrap();
            let opened = env.decrypt(&sealed).unwrap();
            proptest::prop_assert_eq!(opened, data);
        }
    }
}
