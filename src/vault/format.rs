//! Binary vault file format and HMAC integrity verification.
//!
//! A `.vault` file has this layout:
//!
//! ```text
//! [CVLT: 4 bytes][version: 1 byte][header_len: 4 bytes LE][header JSON][credentials JSON][HMAC-SHA256: 32 bytes]
//! ```
//!
//! - **Magic** (`CVLT`): identifies the file as a CredVault vault.
//! - **Version**: format version (currently `1`).
//! - **Header length**: little-endian u32 telling us where the header
//!   JSON ends and the credentials JSON begins.
//! - **Header JSON**: serialized `VaultHeader` (salt, verification token,
//!   KDF parameters).
//! - **Credentials JSON**: object of service name -> `StoredCredential`.
//! - **HMAC-SHA256**: 32-byte tag computed over header + credentials bytes.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::credential::StoredCredential;
use crate::crypto::kdf::Argon2Params;
use crate::errors::{CredVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic bytes at the start of every vault file.
const MAGIC: &[u8; 4] = b"CVLT";

/// Current binary format version.
pub const CURRENT_VERSION: u8 = 1;

/// Size of the HMAC tag appended to the file (SHA-256 = 32 bytes).
const HMAC_LEN: usize = 32;

/// Fixed-size prefix: 4 (magic) + 1 (version) + 4 (header_len).
const PREFIX_LEN: usize = 9;

/// Credentials keyed by service name; sorted so output is deterministic.
pub type StoredCredentials = BTreeMap<String, StoredCredential>;

// ---------------------------------------------------------------------------
// VaultHeader
// ---------------------------------------------------------------------------

/// Metadata stored at the beginning of a vault file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultHeader {
    /// Format version.
    pub version: u8,

    /// The per-vault salt for key derivation (base64 in JSON).
    /// Generated once at setup and never regenerated.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub salt: Vec<u8>,

    /// One-way token used to check the master password at unlock.
    #[serde(serialize_with = "base64_encode", deserialize_with = "base64_decode")]
    pub verification_token: Vec<u8>,

    /// Argon2id parameters used for both the key and the token.
    pub kdf_params: Argon2Params,

    /// When this vault was first created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Write a vault file to disk **atomically**.
///
/// 1. Serialize header and credentials to JSON.
/// 2. Compute HMAC over header + credentials bytes.
/// 3. Write and fsync a temp file in the same directory.
/// 4. Rename the temp file over the target path.
///
/// Readers never see a half-written file; if anything fails the previous
/// file is left untouched and the temp file is removed.
pub fn write_vault(
    path: &Path,
    header: &VaultHeader,
    credentials: &StoredCredentials,
    hmac_key: &[u8],
) -> Result<()> {
    let header_bytes = serde_json::to_vec(header)
        .map_err(|e| CredVaultError::SerializationError(format!("header: {e}")))?;
    let credentials_bytes = serde_json::to_vec(credentials)
        .map_err(|e| CredVaultError::SerializationError(format!("credentials: {e}")))?;

    let hmac_tag = compute_hmac(hmac_key, &header_bytes, &credentials_bytes)?;

    let header_len = u32::try_from(header_bytes.len()).map_err(|_| {
        CredVaultError::SerializationError(format!(
            "header length {} exceeds u32::MAX",
            header_bytes.len()
        ))
    })?;
    let total = PREFIX_LEN + header_bytes.len() + credentials_bytes.len() + HMAC_LEN;
    let mut buf = Vec::with_capacity(total);

    buf.extend_from_slice(MAGIC); // 4 bytes
    buf.push(CURRENT_VERSION); // 1 byte
    buf.extend_from_slice(&header_len.to_le_bytes()); // 4 bytes LE
    buf.extend_from_slice(&header_bytes);
    buf.extend_from_slice(&credentials_bytes);
    buf.extend_from_slice(&hmac_tag); // 32 bytes

    let tmp_path = temp_path(path);
    if let Err(e) = write_synced(&tmp_path, &buf).and_then(|()| fs::rename(&tmp_path, path)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    // The snapshot is already in place; a failed directory sync only
    // weakens crash durability of the rename.
    if let Err(e) = sync_parent_dir(path) {
        tracing::warn!(path = %path.display(), error = %e, "could not sync vault directory");
    }

    Ok(())
}

/// Raw data read from a vault file on disk.
///
/// Keeps the original bytes so the HMAC can be verified over the
/// exact bytes that were written, with no re-serialization.
pub struct RawVault {
    pub header: VaultHeader,
    pub credentials: StoredCredentials,
    /// The raw header JSON bytes exactly as stored on disk.
    pub header_bytes: Vec<u8>,
    /// The raw credentials JSON bytes exactly as stored on disk.
    pub credentials_bytes: Vec<u8>,
    /// The HMAC tag stored at the end of the file.
    pub stored_hmac: Vec<u8>,
}

/// Read a vault file from disk and return its parts **with raw bytes**.
///
/// The caller must verify the HMAC over `header_bytes` and
/// `credentials_bytes` before trusting the deserialized data.
pub fn read_vault(path: &Path) -> Result<RawVault> {
    if !path.exists() {
        return Err(CredVaultError::VaultNotFound(path.to_path_buf()));
    }

    let data = fs::read(path)?;
    parse_vault(&data)
}

/// Parse the binary envelope of a vault file.
pub fn parse_vault(data: &[u8]) -> Result<RawVault> {
    let min_size = PREFIX_LEN + HMAC_LEN;
    if data.len() < min_size {
        return Err(CredVaultError::InvalidVaultFormat(
            "file too small to be a valid vault".into(),
        ));
    }

    if &data[0..4] != MAGIC {
        return Err(CredVaultError::InvalidVaultFormat(
            "missing CVLT magic bytes".into(),
        ));
    }

    let version = data[4];
    if version != CURRENT_VERSION {
        return Err(CredVaultError::InvalidVaultFormat(format!(
            "unsupported version {version}, expected {CURRENT_VERSION}"
        )));
    }

    let header_len_u32 = u32::from_le_bytes(
        data[5..9]
            .try_into()
            .map_err(|_| CredVaultError::InvalidVaultFormat("bad header length".into()))?,
    );
    let header_len = usize::try_from(header_len_u32).map_err(|_| {
        CredVaultError::InvalidVaultFormat(format!(
            "header length {header_len_u32} exceeds platform address space"
        ))
    })?;

    let header_end = PREFIX_LEN
        .checked_add(header_len)
        .filter(|end| end.checked_add(HMAC_LEN).is_some_and(|n| n <= data.len()))
        .ok_or_else(|| {
            CredVaultError::InvalidVaultFormat("header length exceeds file size".into())
        })?;

    let header_bytes = data[PREFIX_LEN..header_end].to_vec();
    let credentials_end = data.len() - HMAC_LEN;
    let credentials_bytes = data[header_end..credentials_end].to_vec();
    let stored_hmac = data[credentials_end..].to_vec();

    let header: VaultHeader = serde_json::from_slice(&header_bytes)
        .map_err(|e| CredVaultError::InvalidVaultFormat(format!("header JSON: {e}")))?;

    let credentials: StoredCredentials = serde_json::from_slice(&credentials_bytes)
        .map_err(|e| CredVaultError::InvalidVaultFormat(format!("credentials JSON: {e}")))?;

    Ok(RawVault {
        header,
        credentials,
        header_bytes,
        credentials_bytes,
        stored_hmac,
    })
}

/// Compute HMAC-SHA256 over header + credentials bytes.
pub fn compute_hmac(
    hmac_key: &[u8],
    header_bytes: &[u8],
    credentials_bytes: &[u8],
) -> Result<Vec<u8>> {
    let mac = mac_over(hmac_key, header_bytes, credentials_bytes)?;
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Verify the stored HMAC in constant time.
pub fn verify_hmac(
    hmac_key: &[u8],
    header_bytes: &[u8],
    credentials_bytes: &[u8],
    expected_hmac: &[u8],
) -> Result<()> {
    mac_over(hmac_key, header_bytes, credentials_bytes)?
        .verify_slice(expected_hmac)
        .map_err(|_| {
            CredVaultError::StoreCorrupted(
                "HMAC verification failed: vault file was modified".into(),
            )
        })
}

fn mac_over(hmac_key: &[u8], header_bytes: &[u8], credentials_bytes: &[u8]) -> Result<Hmac<Sha256>> {
    let mut mac = Hmac::<Sha256>::new_from_slice(hmac_key)
        .map_err(|e| CredVaultError::HmacError(format!("invalid HMAC key: {e}")))?;
    mac.update(header_bytes);
    mac.update(credentials_bytes);
    Ok(mac)
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Sibling temp path, so the final rename stays on one filesystem.
fn temp_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);

    // Owner-only from the moment the file exists.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Flush the directory entry so a completed rename survives a crash.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => fs::File::open(dir)?.sync_all(),
        None => fs::File::open(".")?.sync_all(),
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Serde helpers for base64-encoded Vec<u8> fields
// ---------------------------------------------------------------------------

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

pub(crate) fn base64_encode<S>(data: &[u8], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    let encoded = BASE64.encode(data);
    serializer.serialize_str(&encoded)
}

pub(crate) fn base64_decode<'de, D>(deserializer: D) -> std::result::Result<Vec<u8>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    BASE64.decode(&s).map_err(serde::de::Error::custom)
}
