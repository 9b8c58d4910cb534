//! AES-256-GCM authenticated encryption over hex-encoded envelopes.
//!
//! This module provides:
//! - [`encrypt`] — seal a plaintext string under a hex key, returning [`CipherEnvelope`]
//! - [`decrypt`] — authenticate and open a [`CipherEnvelope`] back to the original string
//!
//! Wire format: `ciphertext` is the hex encoding of `raw ciphertext || tag`
//! (the 16-byte authentication tag is appended to the ciphertext bytes before
//! encoding, so a single opaque string carries the full sealed blob), and `iv`
//! is the hex encoding of the 12-byte GCM nonce. The nonce is freshly random
//! per call when not supplied explicitly — nonce reuse under a fixed key
//! breaks GCM authenticity.

use rand::rngs::OsRng;
use rand::RngCore;
use ring::aead;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// AES-256-GCM key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;

/// AES-256-GCM IV (nonce) length in bytes (96 bits).
pub const IV_LEN: usize = 12;

/// AES-256-GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Sealed ciphertext container.
///
/// `ciphertext` hex-encodes `raw ciphertext || 16-byte tag`; `iv` hex-encodes
/// the 12-byte nonce. Both travel together to [`decrypt`]. Any modification
/// to either causes decryption to fail.
#[must_use = "encrypted data must be stored or transmitted"]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherEnvelope {
    /// Hex of `ciphertext || tag`.
    pub ciphertext: String,
    /// Hex of the 96-bit nonce.
    pub iv: String,
}

/// Decode a hex key string and check it is exactly [`KEY_LEN`] bytes.
fn decode_key(secret_key_hex: &str) -> Result<Vec<u8>, String> {
    let key = hex::decode(secret_key_hex).map_err(|e| format!("secret key is not valid hex: {e}"))?;
    if key.len() != KEY_LEN {
        return Err(format!(
            "invalid key length: {} bytes (expected {KEY_LEN})",
            key.len()
        ));
    }
    Ok(key)
}

fn aead_key(key: &[u8]) -> Result<aead::LessSafeKey, String> {
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key)
        .map_err(|_| "failed to create AES-256-GCM key".to_string())?;
    Ok(aead::LessSafeKey::new(unbound))
}

// ---------------------------------------------------------------------------
// Encrypt
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` under a hex-encoded 256-bit key.
///
/// When `iv` is `None` a fresh 96-bit nonce is drawn from `OsRng`; an explicit
/// nonce is for deterministic callers (tests, replayed fixtures) and must
/// never be reused with the same key.
///
/// # Errors
///
/// Returns [`CryptoError::Encrypt`] if the key is not valid hex, is not
/// exactly 32 bytes, or the underlying cipher operation fails.
pub fn encrypt(
    plaintext: &str,
    secret_key_hex: &str,
    iv: Option<[u8; IV_LEN]>,
) -> Result<CipherEnvelope, CryptoError> {
    let mut key = decode_key(secret_key_hex).map_err(CryptoError::Encrypt)?;
    let sealing_key = aead_key(&key);
    key.zeroize();
    let sealing_key = sealing_key.map_err(CryptoError::Encrypt)?;

    let iv_bytes = iv.unwrap_or_else(|| {
        let mut fresh = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut fresh);
        fresh
    });
    let nonce = aead::Nonce::assume_unique_for_key(iv_bytes);

    // Encrypt in place, then append the tag so one opaque blob carries both.
    let mut in_out = plaintext.as_bytes().to_vec();
    let tag = sealing_key
        .seal_in_place_separate_tag(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Encrypt("AES-256-GCM encryption failed".into()))?;
    in_out.extend_from_slice(tag.as_ref());

    Ok(CipherEnvelope {
        ciphertext: hex::encode(&in_out),
        iv: hex::encode(iv_bytes),
    })
}

// ---------------------------------------------------------------------------
// Decrypt
// ---------------------------------------------------------------------------

/// Decrypt a hex ciphertext produced by [`encrypt`].
///
/// The trailing 16-byte tag is split from the decoded ciphertext and checked
/// during opening; tag mismatch, wrong key, or corruption of any byte of the
/// ciphertext, IV, or tag fails — partial or garbage plaintext is never
/// returned.
///
/// # Errors
///
/// Returns [`CryptoError::Decrypt`] if any input fails to hex-decode, the IV
/// is not 12 bytes, the ciphertext is shorter than the tag, the key is not 32
/// bytes of hex, or authentication fails.
pub fn decrypt(
    ciphertext_hex: &str,
    secret_key_hex: &str,
    iv_hex: &str,
) -> Result<String, CryptoError> {
    let mut key = decode_key(secret_key_hex).map_err(CryptoError::Decrypt)?;
    let opening_key = aead_key(&key);
    key.zeroize();
    let opening_key = opening_key.map_err(CryptoError::Decrypt)?;

    let iv = hex::decode(iv_hex)
        .map_err(|e| CryptoError::Decrypt(format!("iv is not valid hex: {e}")))?;
    let nonce = aead::Nonce::try_assume_unique_for_key(&iv).map_err(|_| {
        CryptoError::Decrypt(format!(
            "invalid iv length: {} bytes (expected {IV_LEN})",
            iv.len()
        ))
    })?;

    // `in_out` holds ciphertext || tag, exactly what open_in_place expects.
    let mut in_out = hex::decode(ciphertext_hex)
        .map_err(|e| CryptoError::Decrypt(format!("ciphertext is not valid hex: {e}")))?;
    if in_out.len() < TAG_LEN {
        return Err(CryptoError::Decrypt(format!(
            "ciphertext too short: {} bytes (minimum {TAG_LEN})",
            in_out.len()
        )));
    }

    let plaintext = opening_key
        .open_in_place(nonce, aead::Aad::empty(), &mut in_out)
        .map_err(|_| CryptoError::Decrypt("authentication tag mismatch".into()))?;

    let result = String::from_utf8(plaintext.to_vec())
        .map_err(|_| CryptoError::Decrypt("plaintext is not valid UTF-8".into()));
    in_out.zeroize();
    result
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
