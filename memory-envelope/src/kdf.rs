//! Subkey derivation: HKDF-SHA256 over the master key.

use hkdf::Hkdf;
use sha2::Sha256;

/// Deterministic given `master_key`, `salt`, and `info`.
pub fn derive_subkey(master_key: &[u8; 32], salt: &[u8], info: &[u8]) -> [u8; 32] {
    let salt = if salt.is_empty() { None } else { Some(salt) };
    let hk = Hkdf::<Sha256>::new(salt, master_key);
    let mut out = [0u8; 32];
    // A 32-byte output from HKDF-SHA256 never exceeds the 255*32 expand limit.
    hk.expand(info, &mut out).expect("32-byte okm always fits HKDF-SHA256's expand window");
    out
}
