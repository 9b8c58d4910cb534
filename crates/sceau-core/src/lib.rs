//! `sceau-core` — hashing, authenticated encryption, message signing, and
//! webhook signature envelopes.
//!
//! Every operation is synchronous, stateless, and safe to call concurrently:
//! each call reads only its explicit inputs and the OS CSPRNG, and writes only
//! its return value. Construction errors (bad key material, malformed
//! secrets) surface as [`CryptoError`]; verification failures are always a
//! boolean `false`, never an error.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod error;

pub mod hash;

pub mod keys;

pub mod sign;

pub mod symmetric;

pub mod webhook;

pub use error::CryptoError;
pub use hash::{hash, DigestAlgorithm};
pub use keys::{
    generate_id, generate_rsa_keypair, generate_secret_key, KeyLength, RsaPemKeyPair,
    DEFAULT_ID_SIZE,
};
pub use sign::{sign, verify, SigningKey, VerificationKey};
pub use symmetric::{decrypt, encrypt, CipherEnvelope, IV_LEN, KEY_LEN, TAG_LEN};
pub use webhook::{
    generate_webhook_secret, sign_webhook, verify_webhook, SignedWebhook, WebhookEnvelope,
    WebhookOptions, WebhookVerification, SECRET_PREFIX, VERSION_TAG,
};
