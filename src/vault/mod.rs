//! Vault module: encrypted credential storage.
//!
//! This module provides:
//! - `Credential` and its stored/metadata forms (`credential`)
//! - Binary vault file format with HMAC integrity (`format`)
//! - The lifecycle state machine and `VaultStore` operations (`store`)

pub mod credential;
pub mod format;
pub mod store;

// Re-export the most commonly used items.
pub use credential::{Credential, CredentialMetadata};
pub use format::VaultHeader;
pub use store::{LockedVault, UninitializedVault, VaultState, VaultStore};
