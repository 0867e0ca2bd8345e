//! The vault key and the sub-keys derived from it.
//!
//! The vault key encrypts every credential field directly.  A separate
//! HMAC key for file integrity is expanded from it with HKDF-SHA256
//! (RFC 5869) so the two uses never share key material.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use super::kdf::KEY_LEN;
use crate::errors::{CredVaultError, Result};

/// HKDF `info` label for the file integrity key.
const HMAC_KEY_INFO: &[u8] = b"credvault-hmac-key";

/// Derive an HMAC key from the vault key.
///
/// This key is used to compute an HMAC over the vault file so we can
/// detect edits to the plaintext parts (service names, header).
pub fn derive_hmac_key(vault_key: &[u8]) -> Result<[u8; KEY_LEN]> {
    // The vault key came from Argon2id, so it is already uniformly random;
    // HKDF extract runs with a zero salt.
    let hk = Hkdf::<Sha256>::new(None, vault_key);

    let mut okm = [0u8; KEY_LEN];
    hk.expand(HMAC_KEY_INFO, &mut okm)
        .map_err(|e| CredVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;

    Ok(okm)
}

/// A 32-byte vault key that zeroes its memory when dropped.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Access the raw key bytes (e.g. to pass to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Derive the file integrity key from this vault key.
    pub fn derive_hmac_key(&self) -> Result<[u8; KEY_LEN]> {
        derive_hmac_key(&self.bytes)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}
