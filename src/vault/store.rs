//! Vault lifecycle and credential operations.
//!
//! The lifecycle is an explicit state machine:
//!
//! ```text
//! VaultState::detect ──► Uninitialized ──setup──► VaultStore (unlocked)
//!                   └──► Locked ────────unlock──► VaultStore (unlocked)
//! ```
//!
//! `VaultStore` holds the decrypted credentials and the vault key.  Every
//! mutation is followed by a full, atomic `persist`; if persisting fails
//! the in-memory change is rolled back so memory and disk never diverge.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use subtle::ConstantTimeEq;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::encryption::{decrypt_with_aad, encrypt_with_aad};
use crate::crypto::kdf::{derive_key, generate_salt, verification_token, Argon2Params};
use crate::crypto::keys::VaultKey;
use crate::errors::{CredVaultError, Result};

use super::credential::{Credential, CredentialMetadata, StoredCredential};
use super::format::{self, RawVault, StoredCredentials, VaultHeader, CURRENT_VERSION};

/// Maximum length of a service name in bytes.
const MAX_SERVICE_LEN: usize = 256;

// ---------------------------------------------------------------------------
// Lifecycle states
// ---------------------------------------------------------------------------

/// Where a vault file stands before any password has been supplied.
#[derive(Debug)]
pub enum VaultState {
    /// No backing file yet; call `setup`.
    Uninitialized(UninitializedVault),
    /// A backing file exists; call `unlock`.
    Locked(LockedVault),
}

impl VaultState {
    /// Inspect `path` and pick the starting state.
    ///
    /// `params` only matter for a new vault; an existing vault always
    /// uses the parameters recorded in its header.
    pub fn detect(path: &Path, params: Argon2Params) -> Self {
        if path.exists() {
            Self::Locked(LockedVault {
                path: path.to_path_buf(),
            })
        } else {
            Self::Uninitialized(UninitializedVault {
                path: path.to_path_buf(),
                params,
            })
        }
    }
}

/// A vault that has not been created yet.
#[derive(Debug)]
pub struct UninitializedVault {
    path: PathBuf,
    params: Argon2Params,
}

impl UninitializedVault {
    pub fn new(path: &Path, params: Argon2Params) -> Self {
        Self {
            path: path.to_path_buf(),
            params,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the vault protected by `master_password`.
    ///
    /// Fails with `PasswordMismatch` (and writes nothing) when the
    /// confirmation differs, so the caller can prompt again.  Otherwise
    /// generates a fresh salt, computes the verification token and the
    /// vault key, and persists an empty vault.
    pub fn setup(&self, master_password: &str, confirm_password: &str) -> Result<VaultStore> {
        if master_password.as_bytes().ct_eq(confirm_password.as_bytes()).unwrap_u8() == 0 {
            return Err(CredVaultError::PasswordMismatch);
        }
        if self.path.exists() {
            return Err(CredVaultError::VaultAlreadyExists(self.path.clone()));
        }
        self.params.validate()?;

        let salt = generate_salt();
        let token = verification_token(master_password.as_bytes(), &self.params)?;
        let key = derive_key(master_password.as_bytes(), &salt, &self.params)?;

        let header = VaultHeader {
            version: CURRENT_VERSION,
            salt: salt.to_vec(),
            verification_token: token.to_vec(),
            kdf_params: self.params,
            created_at: Utc::now(),
        };

        let store = VaultStore {
            path: self.path.clone(),
            header,
            credentials: HashMap::new(),
            key,
        };
        store.persist()?;

        info!(path = %self.path.display(), "vault created");
        Ok(store)
    }
}

/// An existing vault whose key has not been derived yet.
#[derive(Debug)]
pub struct LockedVault {
    path: PathBuf,
}

impl LockedVault {
    /// Point at an existing vault file.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CredVaultError::VaultNotFound(path.to_path_buf()));
        }
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unlock the vault with `master_password`.
    ///
    /// A wrong password yields `AuthenticationFailed` before any key is
    /// derived; `self` stays usable for another attempt.  A malformed,
    /// tampered, or undecryptable file yields `StoreCorrupted`.
    pub fn unlock(&self, master_password: &str) -> Result<VaultStore> {
        let raw = format::read_vault(&self.path).map_err(CredVaultError::into_corrupted)?;

        let params = raw.header.kdf_params;
        if let Err(e) = params.validate() {
            warn!(path = %self.path.display(), error = %e, "vault header has unusable KDF parameters");
            return Err(e.into_corrupted());
        }
        let token = Zeroizing::new(
            verification_token(master_password.as_bytes(), &params)
                .map_err(CredVaultError::into_corrupted)?,
        );
        if token.as_slice().ct_eq(&raw.header.verification_token).unwrap_u8() == 0 {
            warn!(path = %self.path.display(), "unlock rejected: wrong master password");
            return Err(CredVaultError::AuthenticationFailed);
        }

        let key = derive_key(master_password.as_bytes(), &raw.header.salt, &params)
            .map_err(CredVaultError::into_corrupted)?;

        let store = VaultStore::load(self.path.clone(), raw, key).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "vault failed integrity checks");
            e.into_corrupted()
        })?;

        debug!(credentials = store.len(), "vault unlocked");
        Ok(store)
    }
}

// ---------------------------------------------------------------------------
// Unlocked vault
// ---------------------------------------------------------------------------

/// An unlocked vault.  Create one with `UninitializedVault::setup` or
/// `LockedVault::unlock`.
pub struct VaultStore {
    /// Path to the `.vault` file on disk.
    path: PathBuf,

    /// Header metadata (salt, token, KDF params, timestamps).
    header: VaultHeader,

    /// Decrypted credentials by service name.
    credentials: HashMap<String, Credential>,

    /// The derived vault key (zeroized on drop).
    key: VaultKey,
}

impl std::fmt::Debug for VaultStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultStore")
            .field("path", &self.path)
            .field("credentials", &self.credentials.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl VaultStore {
    // ------------------------------------------------------------------
    // Credential operations
    // ------------------------------------------------------------------

    /// Insert or overwrite the credential for `service`, then persist.
    ///
    /// This is an unconditional write; ask for overwrite intent with
    /// `contains` first.  An overwritten entry keeps its `created_at`.
    pub fn add_or_replace(&mut self, service: &str, username: &str, password: &str) -> Result<()> {
        validate_service_name(service)?;

        let mut credential = Credential::new(username, password);
        if let Some(existing) = self.credentials.get(service) {
            credential = credential.with_created_at(existing.created_at());
        }

        let previous = self.credentials.insert(service.to_string(), credential);
        if let Err(e) = self.persist() {
            match previous {
                Some(old) => self.credentials.insert(service.to_string(), old),
                None => self.credentials.remove(service),
            };
            return Err(e);
        }

        debug!(service = %service, replaced = previous.is_some(), "credential stored");
        Ok(())
    }

    /// Change the password of `service`, and its username when
    /// `new_username` is non-empty, then persist.
    pub fn update(
        &mut self,
        service: &str,
        new_username: Option<&str>,
        new_password: &str,
    ) -> Result<()> {
        let credential = self
            .credentials
            .get_mut(service)
            .ok_or_else(|| CredVaultError::CredentialNotFound(service.to_string()))?;

        let previous = credential.clone();
        credential.apply_update(new_username, new_password);

        if let Err(e) = self.persist() {
            self.credentials.insert(service.to_string(), previous);
            return Err(e);
        }

        debug!(service = %service, "credential updated");
        Ok(())
    }

    /// Remove the credential for `service`, then persist.
    pub fn delete(&mut self, service: &str) -> Result<()> {
        let removed = self
            .credentials
            .remove(service)
            .ok_or_else(|| CredVaultError::CredentialNotFound(service.to_string()))?;

        if let Err(e) = self.persist() {
            self.credentials.insert(service.to_string(), removed);
            return Err(e);
        }

        debug!(service = %service, "credential deleted");
        Ok(())
    }

    /// Return the decrypted credential for `service`.
    pub fn get(&self, service: &str) -> Result<&Credential> {
        self.credentials
            .get(service)
            .ok_or_else(|| CredVaultError::CredentialNotFound(service.to_string()))
    }

    /// All service names, sorted.
    pub fn list_services(&self) -> Vec<String> {
        let mut services: Vec<String> = self.credentials.keys().cloned().collect();
        services.sort();
        services
    }

    /// Display-safe metadata for every credential, sorted by service.
    pub fn list(&self) -> Vec<CredentialMetadata> {
        let mut list: Vec<CredentialMetadata> = self
            .credentials
            .iter()
            .map(|(service, c)| CredentialMetadata {
                service: service.clone(),
                username: c.username().to_string(),
                created_at: c.created_at(),
                updated_at: c.updated_at(),
            })
            .collect();

        list.sort_by(|a, b| a.service.cmp(&b.service));
        list
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Encrypt every field under the vault key and write a complete
    /// snapshot atomically.
    ///
    /// Each field gets a fresh nonce and is bound to its service name
    /// and field name as associated data.
    pub fn persist(&self) -> Result<()> {
        let key = self.key.as_bytes();
        let mut stored = StoredCredentials::new();

        for (service, credential) in &self.credentials {
            let username = encrypt_with_aad(
                key,
                credential.username().as_bytes(),
                &field_aad(service, Field::Username),
            )?;
            let password = encrypt_with_aad(
                key,
                credential.password().as_bytes(),
                &field_aad(service, Field::Password),
            )?;

            stored.insert(
                service.clone(),
                StoredCredential {
                    username,
                    password,
                    created_at: credential.created_at(),
                    updated_at: credential.updated_at(),
                },
            );
        }

        let mut hmac_key = self.key.derive_hmac_key()?;
        let result = format::write_vault(&self.path, &self.header, &stored, &hmac_key);
        hmac_key.zeroize();
        result?;

        debug!(credentials = stored.len(), "vault persisted");
        Ok(())
    }

    /// Inverse of `persist`: check integrity and decrypt every field.
    fn load(path: PathBuf, raw: RawVault, key: VaultKey) -> Result<Self> {
        let mut hmac_key = key.derive_hmac_key()?;
        let verified = format::verify_hmac(
            &hmac_key,
            &raw.header_bytes,
            &raw.credentials_bytes,
            &raw.stored_hmac,
        );
        hmac_key.zeroize();
        verified?;

        let mut credentials = HashMap::with_capacity(raw.credentials.len());
        for (service, stored) in raw.credentials {
            let username = decrypt_field(key.as_bytes(), &service, Field::Username, &stored.username)?;
            let password = decrypt_field(key.as_bytes(), &service, Field::Password, &stored.password)?;
            credentials.insert(
                service,
                Credential::from_parts(username, password, stored.created_at, stored.updated_at),
            );
        }

        Ok(Self {
            path,
            header: raw.header,
            credentials,
            key,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the path to the vault file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` if a credential is stored for `service`.
    pub fn contains(&self, service: &str) -> bool {
        self.credentials.contains_key(service)
    }

    /// Returns the number of stored credentials.
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Returns the vault creation timestamp.
    pub fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
        self.header.created_at
    }

    /// Returns the Argon2id parameters recorded at setup.
    pub fn kdf_params(&self) -> Argon2Params {
        self.header.kdf_params
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Field {
    Username,
    Password,
}

impl Field {
    fn as_str(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
        }
    }
}

/// Associated data binding a ciphertext to its entry: `<service>\0<field>`.
fn field_aad(service: &str, field: Field) -> Vec<u8> {
    let mut aad = Vec::with_capacity(service.len() + 1 + 8);
    aad.extend_from_slice(service.as_bytes());
    aad.push(0);
    aad.extend_from_slice(field.as_str().as_bytes());
    aad
}

fn decrypt_field(key: &[u8], service: &str, field: Field, blob: &[u8]) -> Result<String> {
    let bytes = decrypt_with_aad(key, blob, &field_aad(service, field))?;

    // On error, zeroize the bytes inside the error before discarding.
    String::from_utf8(bytes).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        CredVaultError::StoreCorrupted(format!(
            "{} for '{service}' is not valid UTF-8",
            field.as_str()
        ))
    })
}

/// Validate that a service name can be stored.
///
/// Must be non-empty, at most 256 bytes, and free of control characters.
/// Case and all other characters are preserved as given.
fn validate_service_name(service: &str) -> Result<()> {
    if service.is_empty() {
        return Err(CredVaultError::InvalidServiceName(
            "service name cannot be empty".into(),
        ));
    }
    if service.len() > MAX_SERVICE_LEN {
        return Err(CredVaultError::InvalidServiceName(format!(
            "service name cannot exceed {MAX_SERVICE_LEN} bytes"
        )));
    }
    if service.chars().any(char::is_control) {
        return Err(CredVaultError::InvalidServiceName(
            "service name cannot contain control characters".into(),
        ));
    }
    Ok(())
}
