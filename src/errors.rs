use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in CredVault.
#[derive(Debug, Error)]
pub enum CredVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: wrong key or corrupted data")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    // --- Authentication errors ---
    #[error("Master passwords do not match")]
    PasswordMismatch,

    #[error("Authentication failed: wrong master password")]
    AuthenticationFailed,

    // --- Vault errors ---
    #[error("Vault not found at {0}")]
    VaultNotFound(PathBuf),

    #[error("Vault already exists at {0}")]
    VaultAlreadyExists(PathBuf),

    #[error("Invalid vault format: {0}")]
    InvalidVaultFormat(String),

    #[error("Credential store is corrupted: {0}")]
    StoreCorrupted(String),

    #[error("HMAC error: {0}")]
    HmacError(String),

    #[error("No credential stored for service '{0}'")]
    CredentialNotFound(String),

    #[error("Invalid service name: {0}")]
    InvalidServiceName(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,
}

impl CredVaultError {
    /// Collapse a low-level failure seen while loading the store into
    /// `StoreCorrupted`, so callers never see cryptographic internals.
    pub(crate) fn into_corrupted(self) -> Self {
        match self {
            Self::StoreCorrupted(_) | Self::VaultNotFound(_) | Self::AuthenticationFailed => self,
            Self::DecryptionFailed => {
                Self::StoreCorrupted("a stored field failed authenticated decryption".into())
            }
            other => Self::StoreCorrupted(other.to_string()),
        }
    }
}

/// Convenience type alias for CredVault results.
pub type Result<T> = std::result::Result<T, CredVaultError>;
