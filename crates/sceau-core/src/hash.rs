//! Digest algorithm selection and hex-encoded hashing.
//!
//! This module provides:
//! - [`DigestAlgorithm`] — the closed set of supported digests (SHA-256, SHA-512)
//! - [`hash`] — one-shot hex digest of a string input
//!
//! The algorithm set is a closed enumeration: any other name is a validation
//! failure at parse time ([`CryptoError::Hash`]), never a silent default.

use std::fmt;
use std::str::FromStr;

use ring::{digest, hmac};

use crate::error::CryptoError;

/// Supported digest algorithms for hashing and HMAC signing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256 (default everywhere a digest is implied).
    Sha256,
    /// SHA-512.
    Sha512,
}

impl DigestAlgorithm {
    /// The `ring` one-shot digest algorithm.
    #[must_use]
    pub(crate) fn digest_algorithm(self) -> &'static digest::Algorithm {
        match self {
            Self::Sha256 => &digest::SHA256,
            Self::Sha512 => &digest::SHA512,
        }
    }

    /// The `ring` HMAC algorithm keyed on this digest.
    #[must_use]
    pub(crate) const fn hmac_algorithm(self) -> hmac::Algorithm {
        match self {
            Self::Sha256 => hmac::HMAC_SHA256,
            Self::Sha512 => hmac::HMAC_SHA512,
        }
    }

    /// Canonical lowercase name (`"sha256"` / `"sha512"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(CryptoError::Hash(format!(
                "unsupported digest algorithm: {other}"
            ))),
        }
    }
}

/// Compute the lowercase hex digest of `input` under `algorithm`.
#[must_use]
pub fn hash(input: &str, algorithm: DigestAlgorithm) -> String {
    let digest = digest::digest(algorithm.digest_algorithm(), input.as_bytes());
    hex::encode(digest.as_ref())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
