//! Integration tests for the CredVault crypto module.

use credvault::crypto::keys::{derive_hmac_key, VaultKey};
use credvault::crypto::{
    decrypt, derive_key, encrypt, generate_salt, verification_token, Argon2Params,
};
use credvault::errors::CredVaultError;

/// Fastest parameters the KDF accepts.
const PARAMS: Argon2Params = Argon2Params::MINIMUM;

// ---------------------------------------------------------------------------
// Encryption round-trip
// ---------------------------------------------------------------------------

#[test]
fn encrypt_decrypt_roundtrip() {
    let key = [0xABu8; 32];
    let plaintext = b"p@ss1";

    let ciphertext = encrypt(&key, plaintext).expect("encrypt should succeed");

    // Ciphertext must carry a 12-byte nonce and a 16-byte tag.
    assert_eq!(ciphertext.len(), plaintext.len() + 12 + 16);

    let recovered = decrypt(&key, &ciphertext).expect("decrypt should succeed");
    assert_eq!(recovered, plaintext);
}

#[test]
fn encrypt_produces_different_ciphertext_each_time() {
    let key = [0xCDu8; 32];
    let plaintext = b"alice@example.com";

    let ct1 = encrypt(&key, plaintext).expect("encrypt 1");
    let ct2 = encrypt(&key, plaintext).expect("encrypt 2");

    // A fresh nonce per call means the outputs (and their nonces) differ.
    assert_ne!(ct1, ct2, "two encryptions of the same plaintext must differ");
    assert_ne!(ct1[..12], ct2[..12], "nonces must not repeat");

    assert_eq!(decrypt(&key, &ct1).unwrap(), plaintext);
    assert_eq!(decrypt(&key, &ct2).unwrap(), plaintext);
}

#[test]
fn decrypt_with_wrong_key_fails() {
    let key = [0x11u8; 32];
    let wrong_key = [0x22u8; 32];

    let ciphertext = encrypt(&key, b"hunter2").expect("encrypt");
    let result = decrypt(&wrong_key, &ciphertext);

    assert!(matches!(result, Err(CredVaultError::DecryptionFailed)));
}

#[test]
fn decrypt_with_truncated_data_fails() {
    let key = [0xAAu8; 32];
    assert!(matches!(
        decrypt(&key, &[0u8; 5]),
        Err(CredVaultError::DecryptionFailed)
    ));
    // A nonce alone, with no room for a tag, is malformed too.
    assert!(matches!(
        decrypt(&key, &[0u8; 12]),
        Err(CredVaultError::DecryptionFailed)
    ));
}

#[test]
fn every_single_byte_flip_is_detected() {
    let key = [0xBBu8; 32];
    let ciphertext = encrypt(&key, b"correct horse battery staple").expect("encrypt");

    for i in 0..ciphertext.len() {
        let mut tampered = ciphertext.clone();
        tampered[i] ^= 0x01;
        assert!(
            matches!(decrypt(&key, &tampered), Err(CredVaultError::DecryptionFailed)),
            "flip at byte {i} went unnoticed"
        );
    }
}

// ---------------------------------------------------------------------------
// Key derivation (Argon2id)
// ---------------------------------------------------------------------------

#[test]
fn derive_key_same_inputs_same_output() {
    let salt = generate_salt();

    let key1 = derive_key(b"Tr0ub4dor", &salt, &PARAMS).expect("derive 1");
    let key2 = derive_key(b"Tr0ub4dor", &salt, &PARAMS).expect("derive 2");

    assert_eq!(key1.as_bytes(), key2.as_bytes());
}

#[test]
fn derive_key_is_stable_across_runs() {
    // A fixed salt gives a fixed key, so vaults written by one process
    // open in the next.
    let key = derive_key(b"Tr0ub4dor", &[0x5Au8; 32], &PARAMS).expect("derive");
    let again = derive_key(b"Tr0ub4dor", &[0x5Au8; 32], &PARAMS).expect("derive again");
    assert_eq!(key.as_bytes(), again.as_bytes());
    assert_ne!(key.as_bytes(), &[0u8; 32]);
}

#[test]
fn derive_key_different_salts_different_keys() {
    let key1 = derive_key(b"same-password", &generate_salt(), &PARAMS).expect("derive 1");
    let key2 = derive_key(b"same-password", &generate_salt(), &PARAMS).expect("derive 2");

    assert_ne!(key1.as_bytes(), key2.as_bytes());
}

#[test]
fn derive_key_different_passwords_different_keys() {
    let salt = generate_salt();

    let key1 = derive_key(b"password-one", &salt, &PARAMS).expect("derive 1");
    let key2 = derive_key(b"password-two", &salt, &PARAMS).expect("derive 2");

    assert_ne!(key1.as_bytes(), key2.as_bytes());
}

#[test]
fn derive_key_rejects_weak_params() {
    let weak = Argon2Params {
        memory_kib: 4_096,
        iterations: 1,
        parallelism: 1,
    };
    assert!(matches!(
        derive_key(b"pw", &generate_salt(), &weak),
        Err(CredVaultError::KeyDerivationFailed(_))
    ));
}

// ---------------------------------------------------------------------------
// Verification token
// ---------------------------------------------------------------------------

#[test]
fn verification_token_is_deterministic_and_salt_free() {
    let t1 = verification_token(b"Tr0ub4dor", &PARAMS).expect("token 1");
    let t2 = verification_token(b"Tr0ub4dor", &PARAMS).expect("token 2");
    assert_eq!(t1, t2);

    let other = verification_token(b"wrong", &PARAMS).expect("token 3");
    assert_ne!(t1, other);
}

#[test]
fn verification_token_is_not_the_encryption_key() {
    let token = verification_token(b"Tr0ub4dor", &PARAMS).expect("token");
    let key = derive_key(b"Tr0ub4dor", &generate_salt(), &PARAMS).expect("key");

    assert_ne!(&token, key.as_bytes());

    // Nor can the token stand in for the key.
    let ciphertext = encrypt(key.as_bytes(), b"secret").unwrap();
    assert!(decrypt(&token, &ciphertext).is_err());
}

#[test]
fn verification_token_does_not_contain_the_password() {
    let token = verification_token(b"Tr0ub4dorTr0ub4dorTr0ub4dor12345", &PARAMS).unwrap();
    assert_ne!(&token[..], b"Tr0ub4dorTr0ub4dorTr0ub4dor12345");
}

// ---------------------------------------------------------------------------
// HKDF sub-key
// ---------------------------------------------------------------------------

#[test]
fn hmac_key_differs_from_vault_key() {
    let raw = [0x55u8; 32];
    let key = VaultKey::new(raw);

    let hmac_key = key.derive_hmac_key().expect("hmac key");
    assert_ne!(&hmac_key, key.as_bytes());
    assert_eq!(hmac_key, derive_hmac_key(&raw).expect("fn hmac"));
}

#[test]
fn vault_key_debug_is_redacted() {
    let key = VaultKey::new([0x12u8; 32]);
    let out = format!("{key:?}");
    assert!(out.contains("REDACTED"));
    assert!(!out.contains("18"));
}

// ---------------------------------------------------------------------------
// End-to-end: password -> key -> encrypt/decrypt
// ---------------------------------------------------------------------------

#[test]
fn full_crypto_pipeline() {
    let salt = generate_salt();
    let key = derive_key(b"Tr0ub4dor", &salt, &PARAMS).expect("derive key");

    let ciphertext = encrypt(key.as_bytes(), b"p@ss1").expect("encrypt");

    // Re-derive as a later unlock would.
    let reopened = derive_key(b"Tr0ub4dor", &salt, &PARAMS).expect("re-derive");
    assert_eq!(decrypt(reopened.as_bytes(), &ciphertext).unwrap(), b"p@ss1");

    let wrong = derive_key(b"wrong", &salt, &PARAMS).expect("wrong key");
    assert!(decrypt(wrong.as_bytes(), &ciphertext).is_err());
}
