//! AEAD primitive: AES-256-GCM.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use getrandom::getrandom;

use crate::error::{DecryptError, EncryptError};

/// Draw a fresh random 12-byte nonce. Never derived from content.
pub fn nonce() -> Result<[u8; 12], EncryptError> {
    let mut n = [0u8; 12];
    getrandom(&mut n).map_err(|_| EncryptError::Internal)?;
    Ok(n)
}

pub fn aead_seal(
    key: &[u8; 32],
    nonce: &[u8; 12],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, EncryptError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| EncryptError::Internal)?;
    let n = Nonce::from_slice(nonce);
    let payload = Payload { msg: plaintext, aad };
    cipher.encrypt(n, payload).map_err(|_| EncryptError::Internal)
}

pub fn aead_open(
    key: &[u8; 32],
    nonce: &[u8; 12],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, DecryptError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| DecryptError::AuthenticationFailed)?;
    let n = Nonce::from_slice(nonce);
    let payload = Payload { msg: ciphertext, aad };
    cipher
        .decrypt(n, payload)
        .map_err(|_| DecryptError::AuthenticationFailed)
}
