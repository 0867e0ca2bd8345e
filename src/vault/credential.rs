//! Credential types held by a vault.
//!
//! `Credential` is the plaintext form that lives in memory while the
//! vault is unlocked.  `StoredCredential` is its on-disk form: the
//! username and password are individually encrypted blobs, serialized as
//! base64 strings in JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use super::format::{base64_decode, base64_encode};

/// A decrypted username/password pair.
///
/// The text fields are wiped when the value is dropped and are redacted
/// from `Debug` output.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Credential {
    username: String,
    password: String,
    #[zeroize(skip)]
    created_at: DateTime<Utc>,
    #[zeroize(skip)]
    updated_at: DateTime<Utc>,
}

impl Credential {
    /// Build a new credential stamped with the current time.
    pub fn new(username: &str, password: &str) -> Self {
        let now = Utc::now();
        Self {
            username: username.to_string(),
            password: password.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn from_parts(
        username: String,
        password: String,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            username,
            password,
            created_at,
            updated_at,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replace the password, and the username when a non-empty one is given.
    pub(crate) fn apply_update(&mut self, new_username: Option<&str>, new_password: &str) {
        if let Some(username) = new_username.filter(|u| !u.is_empty()) {
            self.username.zeroize();
            self.username = username.to_string();
        }
        self.password.zeroize();
        self.password = new_password.to_string();
        self.updated_at = Utc::now();
    }

    /// Keep the original creation time when an entry is overwritten.
    pub(crate) fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &"[REDACTED]")
            .field("password", &"[REDACTED]")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// A credential as written to the vault file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    /// Encrypted username (nonce + ciphertext + tag).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub username: Vec<u8>,

    /// Encrypted password (nonce + ciphertext + tag).
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub password: Vec<u8>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Display-safe summary of a credential (no password).
///
/// Returned by `VaultStore::list` so callers can render a listing
/// without touching any password.
#[derive(Debug, Clone)]
pub struct CredentialMetadata {
    pub service: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
