//! Cryptographic primitives for CredVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - Argon2id key derivation and the verification token (`kdf`)
//! - The zeroizing vault key and its HKDF sub-keys (`keys`)
//!
//! Nothing here knows about credentials or files.

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, decrypt_with_aad, encrypt, encrypt_with_aad};
pub use kdf::{derive_key, generate_salt, verification_token, Argon2Params};
pub use keys::{derive_hmac_key, VaultKey};
