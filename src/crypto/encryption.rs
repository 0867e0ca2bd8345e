//! AES-256-GCM authenticated encryption.
//!
//! Each call to `encrypt` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext.  `decrypt` splits the nonce back out
//! before decrypting.
//!
//! Layout of the returned byte buffer:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};

use crate::errors::{CredVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Size of the AES-256-GCM authentication tag in bytes.
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` with a 32-byte `key`.
///
/// Returns the nonce prepended to the ciphertext (nonce || ciphertext).
pub fn encrypt(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    encrypt_with_aad(key, plaintext, &[])
}

/// Decrypt data that was produced by `encrypt`.
pub fn decrypt(key: &[u8], ciphertext_with_nonce: &[u8]) -> Result<Vec<u8>> {
    decrypt_with_aad(key, ciphertext_with_nonce, &[])
}

/// Encrypt `plaintext` and bind it to `aad`.
///
/// The associated data is authenticated but not stored; the same bytes
/// must be supplied to `decrypt_with_aad`.
pub fn encrypt_with_aad(key: &[u8], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| CredVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    // Never reuse a nonce under the same key.
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(
            &nonce,
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|e| CredVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt data produced by `encrypt_with_aad` under the same `aad`.
///
/// Expects the first 12 bytes to be the nonce, followed by the
/// ciphertext and tag.  Any mismatch is reported as `DecryptionFailed`.
pub fn decrypt_with_aad(key: &[u8], ciphertext_with_nonce: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
    if ciphertext_with_nonce.len() < NONCE_LEN + TAG_LEN {
        return Err(CredVaultError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = ciphertext_with_nonce.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CredVaultError::DecryptionFailed)?;

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CredVaultError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = [0x42u8; 32];
        let ct = encrypt(&key, b"").unwrap();
        assert_eq!(ct.len(), NONCE_LEN + TAG_LEN);
        assert!(decrypt(&key, &ct).unwrap().is_empty());
    }

    #[test]
    fn aad_mismatch_fails() {
        let key = [0x42u8; 32];
        let ct = encrypt_with_aad(&key, b"alice", b"github\0username").unwrap();

        assert!(decrypt_with_aad(&key, &ct, b"gitlab\0username").is_err());
        assert!(decrypt(&key, &ct).is_err());
        assert_eq!(
            decrypt_with_aad(&key, &ct, b"github\0username").unwrap(),
            b"alice"
        );
    }

    #[test]
    fn short_key_is_rejected() {
        assert!(matches!(
            encrypt(&[0u8; 16], b"x"),
            Err(CredVaultError::EncryptionFailed(_))
        ));
    }
}
