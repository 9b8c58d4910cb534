//! Cryptographic error types for `sceau-core`.

use thiserror::Error;

/// Errors produced by cryptographic operations.
///
/// Only construction-time misuse surfaces as an error: bad key material,
/// unsupported algorithm names, malformed secrets. Verification failures are
/// never errors — [`crate::sign::verify`] and [`crate::webhook::verify_webhook`]
/// resolve every failure mode to boolean `false`.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Symmetric encryption failure (bad key length, cipher setup).
    #[error("encryption failed: {0}")]
    Encrypt(String),

    /// Symmetric decryption failure — corrupted ciphertext, wrong key,
    /// authentication tag mismatch, or malformed IV/hex input.
    #[error("decryption failed: {0}")]
    Decrypt(String),

    /// Unsupported digest algorithm name.
    #[error("hash failed: {0}")]
    Hash(String),

    /// RSA key pair generation or PEM encoding failure.
    #[error("key pair generation failed: {0}")]
    KeyPair(String),

    /// RSA signing failure (malformed private key, provider rejection).
    #[error("asymmetric signing failed: {0}")]
    SignAsymmetric(String),

    /// HMAC signing failure (missing secret).
    #[error("symmetric signing failed: {0}")]
    SignSymmetric(String),

    /// Empty, missing, or wrongly-prefixed webhook secret.
    #[error("invalid webhook secret: {0}")]
    InvalidSecret(String),

    /// Webhook envelope JSON serialization failure.
    #[error("envelope serialization failed: {0}")]
    Serialization(String),
}
