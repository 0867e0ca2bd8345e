//! Password-based key derivation using Argon2id.
//!
//! Two independent derivations are made from the master password:
//!
//! - the **vault key**, keyed by the random per-vault salt, which
//!   encrypts credential fields;
//! - the **verification token**, keyed by a fixed domain-separation salt,
//!   which is stored in the vault header and compared at unlock time.
//!
//! Because the salts differ, the stored token reveals nothing about the
//! vault key, and the token can be checked without touching the salt.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::keys::VaultKey;
use crate::errors::{CredVaultError, Result};

/// Length of the salt in bytes (256 bits).
pub const SALT_LEN: usize = 32;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the verification token in bytes.
pub const TOKEN_LEN: usize = 32;

/// Salt used for the verification token only.
const TOKEN_SALT: &[u8] = b"credvault/verify/v1";

/// Minimum safe memory cost in KiB (19 MiB).
pub const MIN_MEMORY_KIB: u32 = 19_456;

/// Minimum number of Argon2 passes.
pub const MIN_ITERATIONS: u32 = 2;

/// Largest memory cost accepted (4 GiB).
pub const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

/// Largest number of Argon2 passes accepted.
pub const MAX_ITERATIONS: u32 = 64;

/// Largest number of lanes accepted.
pub const MAX_PARALLELISM: u32 = 64;

/// Argon2id work parameters.
///
/// Recorded in the vault header at setup so unlock always re-derives
/// with the exact same settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 65 536 = 64 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 3).
    pub iterations: u32,
    /// Parallelism lanes (default: 4).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 65_536,
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl Argon2Params {
    /// The weakest parameters the vault accepts.
    pub const MINIMUM: Self = Self {
        memory_kib: MIN_MEMORY_KIB,
        iterations: MIN_ITERATIONS,
        parallelism: 1,
    };

    /// Reject parameters outside the accepted range.
    ///
    /// The upper bounds matter at unlock: the parameters come from the
    /// file header and are used before the file can be authenticated.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_MEMORY_KIB..=MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(CredVaultError::KeyDerivationFailed(format!(
                "Argon2 memory_kib must be between {MIN_MEMORY_KIB} and {MAX_MEMORY_KIB} (got {})",
                self.memory_kib
            )));
        }
        if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&self.iterations) {
            return Err(CredVaultError::KeyDerivationFailed(format!(
                "Argon2 iterations must be between {MIN_ITERATIONS} and {MAX_ITERATIONS} (got {})",
                self.iterations
            )));
        }
        if !(1..=MAX_PARALLELISM).contains(&self.parallelism) {
            return Err(CredVaultError::KeyDerivationFailed(format!(
                "Argon2 parallelism must be between 1 and {MAX_PARALLELISM} (got {})",
                self.parallelism
            )));
        }
        Ok(())
    }
}

/// Derive the vault encryption key from a password and the vault salt.
///
/// The same password + salt + params will always produce the same key.
pub fn derive_key(password: &[u8], salt: &[u8], params: &Argon2Params) -> Result<VaultKey> {
    let mut bytes = [0u8; KEY_LEN];
    argon2id_into(password, salt, params, &mut bytes)?;
    Ok(VaultKey::new(bytes))
}

/// Compute the salt-independent verification token for a password.
///
/// Only ever compared against the stored token; never used as key
/// material.
pub fn verification_token(password: &[u8], params: &Argon2Params) -> Result<[u8; TOKEN_LEN]> {
    let mut token = [0u8; TOKEN_LEN];
    argon2id_into(password, TOKEN_SALT, params, &mut token)?;
    Ok(token)
}

/// Generate a cryptographically random 32-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

fn argon2id_into(password: &[u8], salt: &[u8], params: &Argon2Params, out: &mut [u8]) -> Result<()> {
    params.validate()?;

    let argon2_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(out.len()),
    )
    .map_err(|e| CredVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params)
        .hash_password_into(password, salt, out)
        .map_err(|e| CredVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_weak_params() {
        let weak = Argon2Params {
            memory_kib: 8_192,
            ..Argon2Params::MINIMUM
        };
        assert!(derive_key(b"pw", &[0u8; SALT_LEN], &weak).is_err());

        let one_pass = Argon2Params {
            iterations: 1,
            ..Argon2Params::MINIMUM
        };
        assert!(verification_token(b"pw", &one_pass).is_err());
    }

    #[test]
    fn rejects_oversized_params() {
        let huge_memory = Argon2Params {
            memory_kib: u32::MAX,
            ..Argon2Params::MINIMUM
        };
        assert!(huge_memory.validate().is_err());
        assert!(verification_token(b"pw", &huge_memory).is_err());

        let endless = Argon2Params {
            iterations: u32::MAX,
            ..Argon2Params::MINIMUM
        };
        assert!(derive_key(b"pw", &[0u8; SALT_LEN], &endless).is_err());

        let wide = Argon2Params {
            parallelism: MAX_PARALLELISM + 1,
            ..Argon2Params::MINIMUM
        };
        assert!(wide.validate().is_err());

        let ceiling = Argon2Params {
            memory_kib: MAX_MEMORY_KIB,
            iterations: MAX_ITERATIONS,
            parallelism: MAX_PARALLELISM,
        };
        assert!(ceiling.validate().is_ok());
    }

    #[test]
    fn token_is_not_the_key() {
        let params = Argon2Params::MINIMUM;
        let token = verification_token(b"Tr0ub4dor", &params).unwrap();
        let vault_key = derive_key(b"Tr0ub4dor", &generate_salt(), &params).unwrap();
        assert_ne!(&token, vault_key.as_bytes());
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt(), generate_salt());
    }
}
