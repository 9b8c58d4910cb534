//! Signed webhook envelopes.
//!
//! This module provides:
//! - [`sign_webhook`] — wrap a payload in a signed, versioned envelope
//! - [`verify_webhook`] — check an envelope on the receiving side
//! - [`generate_webhook_secret`] — mint a `whsec_`-prefixed shared secret
//!
//! # Wire protocol
//!
//! The envelope serializes as `{ id, timestamp, ...extra, data }` in that
//! order, deterministically. The signature is computed over the canonical
//! base `"<id>.<timestamp>.<serialized envelope>"` — both the message id and
//! the timestamp are part of the signed bytes, so a valid signature cannot be
//! replayed against a different id or timestamp. The signature string is
//! versioned (`v1,<hex hmac-sha256>`); an unknown version tag is rejected so
//! the scheme can migrate without breaking old verifiers.
//!
//! Secrets use the `whsec_<key>` format; the key material actually fed to the
//! HMAC is the substring after the prefix.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::error::CryptoError;
use crate::hash::DigestAlgorithm;
use crate::keys::random_alphanumeric;
use crate::sign::{sign_symmetric, verify_symmetric};

/// Required prefix of webhook secrets.
pub const SECRET_PREFIX: &str = "whsec_";

/// Current signature scheme version tag.
pub const VERSION_TAG: &str = "v1";

/// Random portion length of a generated webhook secret.
const SECRET_KEY_CHARS: usize = 32;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The signed payload wrapper: `{ id, timestamp, ...extra, data }`.
///
/// Field order in the serialized form is stable — the named fields in
/// declaration order with the extra fields (sorted by key) flattened between
/// `timestamp` and `data` — because the signature covers the serialized bytes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WebhookEnvelope<T> {
    /// Message id — caller-supplied or a fresh UUID v4.
    pub id: String,
    /// Milliseconds since the Unix epoch at signing time.
    pub timestamp: i64,
    /// Caller-supplied top-level extra fields (e.g. an event type).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// The wrapped payload.
    pub data: T,
}

/// Optional knobs for [`sign_webhook`].
#[derive(Clone, Debug, Default)]
pub struct WebhookOptions {
    /// Message id; a UUID v4 is generated when absent.
    pub id: Option<String>,
    /// Extra top-level envelope fields, included in the signed bytes.
    pub extra: Map<String, Value>,
}

/// Everything [`sign_webhook`] hands back to the sender.
///
/// `raw` is the exact serialized form the signature covers — transmit it as
/// the request body so the receiver never has to re-serialize.
#[derive(Clone, Debug)]
pub struct SignedWebhook<T> {
    /// The envelope that was signed.
    pub payload: WebhookEnvelope<T>,
    /// Versioned signature string: `v1,<hex>`.
    pub signature: String,
    /// The serialized envelope bytes the signature covers.
    pub raw: String,
}

/// Inputs to [`verify_webhook`].
#[derive(Clone, Debug)]
pub struct WebhookVerification<'a> {
    /// The received serialized envelope, byte-for-byte as transmitted.
    pub payload: &'a str,
    /// The shared `whsec_` secret.
    pub secret: &'a str,
    /// The received versioned signature string.
    pub signature: &'a str,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the HMAC key material from a `whsec_` secret.
fn derive_key(secret: &str) -> Result<&str, CryptoError> {
    if secret.is_empty() {
        return Err(CryptoError::InvalidSecret("secret is required".into()));
    }
    let key = secret.strip_prefix(SECRET_PREFIX).ok_or_else(|| {
        CryptoError::InvalidSecret(format!("secret must start with `{SECRET_PREFIX}`"))
    })?;
    if key.is_empty() {
        return Err(CryptoError::InvalidSecret(
            "secret has no key material after the prefix".into(),
        ));
    }
    Ok(key)
}

fn unix_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|elapsed| i64::try_from(elapsed.as_millis()).ok())
        .unwrap_or_default()
}

/// The canonical signing base: `"<id>.<timestamp>.<raw>"`.
fn canonical_base(id: &str, timestamp: i64, raw: &str) -> String {
    format!("{id}.{timestamp}.{raw}")
}

// ---------------------------------------------------------------------------
// Sign
// ---------------------------------------------------------------------------

/// Build and sign a webhook envelope around `data`.
///
/// The envelope id defaults to a fresh UUID v4 and the timestamp to the
/// current time in milliseconds. The returned [`SignedWebhook::raw`] is the
/// exact byte string the signature covers.
///
/// # Errors
///
/// Returns [`CryptoError::InvalidSecret`] if the secret is empty, lacks the
/// `whsec_` prefix, or carries no key material, and
/// [`CryptoError::Serialization`] if the payload cannot be serialized.
pub fn sign_webhook<T: Serialize>(
    data: T,
    secret: &str,
    options: WebhookOptions,
) -> Result<SignedWebhook<T>, CryptoError> {
    let key = derive_key(secret)?;

    let payload = WebhookEnvelope {
        id: options.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        timestamp: unix_timestamp_ms(),
        extra: options.extra,
        data,
    };

    let raw = serde_json::to_string(&payload)
        .map_err(|e| CryptoError::Serialization(e.to_string()))?;
    let base = canonical_base(&payload.id, payload.timestamp, &raw);
    let hex_signature = sign_symmetric(&base, key, DigestAlgorithm::Sha256)?;

    debug!(id = %payload.id, timestamp = payload.timestamp, "signed webhook envelope");

    Ok(SignedWebhook {
        signature: format!("{VERSION_TAG},{hex_signature}"),
        payload,
        raw,
    })
}

// ---------------------------------------------------------------------------
// Verify
// ---------------------------------------------------------------------------

/// Verify a received webhook envelope.
///
/// The canonical base is recomputed from the *received* serialized bytes and
/// the id/timestamp parsed out of them — never from a re-serialized object —
/// and compared in constant time. Every failure mode (unknown version tag,
/// malformed secret, unparsable payload, missing id or timestamp, HMAC
/// mismatch) yields `false`; verification never panics or returns an error.
#[must_use]
pub fn verify_webhook(input: &WebhookVerification<'_>) -> bool {
    let Ok(key) = derive_key(input.secret) else {
        return false;
    };
    let Some((version, hex_signature)) = input.signature.split_once(',') else {
        return false;
    };
    if version != VERSION_TAG {
        return false;
    }

    let Ok(envelope) = serde_json::from_str::<Value>(input.payload) else {
        return false;
    };
    let Some(id) = envelope.get("id").and_then(Value::as_str) else {
        return false;
    };
    let Some(timestamp) = envelope.get("timestamp").and_then(Value::as_i64) else {
        return false;
    };

    let base = canonical_base(id, timestamp, input.payload);
    verify_symmetric(&base, key, DigestAlgorithm::Sha256, hex_signature)
}

// ---------------------------------------------------------------------------
// Secret generation
// ---------------------------------------------------------------------------

/// Generate a fresh webhook secret: `whsec_` + 32 random alphanumeric chars.
#[must_use]
pub fn generate_webhook_secret() -> String {
    format!("{SECRET_PREFIX}{}", random_alphanumeric(SECRET_KEY_CHARS))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "whsec_C2FVsBQIhrscChlQIMV3b5sseGmrLb28";

    #[test]
    fn sign_verify_roundtrip() {
        let signed = sign_webhook(json!({ "event": "x" }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        assert!(signed.signature.starts_with("v1,"));
        assert!(verify_webhook(&WebhookVerification {
            payload: &signed.raw,
            secret: SECRET,
            signature: &signed.signature,
        }));
    }

    #[test]
    fn envelope_serialization_is_deterministic() {
        let mut extra = Map::new();
        extra.insert("type".into(), json!("user.created"));
        let envelope = WebhookEnvelope {
            id: "msg_1".into(),
            timestamp: 1_654_012_591_835,
            extra,
            data: json!({ "userId": "123" }),
        };
        let raw = serde_json::to_string(&envelope).expect("serialize should succeed");
        assert_eq!(
            raw,
            r#"{"id":"msg_1","timestamp":1654012591835,"type":"user.created","data":{"userId":"123"}}"#
        );
    }

    #[test]
    fn custom_id_is_honored_and_signed() {
        let options = WebhookOptions {
            id: Some("msg_custom".into()),
            ..WebhookOptions::default()
        };
        let signed =
            sign_webhook(json!({ "n": 1 }), SECRET, options).expect("sign should succeed");
        assert_eq!(signed.payload.id, "msg_custom");
        assert!(signed.raw.contains(r#""id":"msg_custom""#));
    }

    #[test]
    fn generated_id_is_uuid_v4() {
        let signed = sign_webhook(json!({}), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        let id = uuid::Uuid::parse_str(&signed.payload.id).expect("id should be a UUID");
        assert_eq!(id.get_version_num(), 4);
    }

    #[test]
    fn extra_fields_are_carried_and_signed() {
        let mut extra = Map::new();
        extra.insert("type".into(), json!("user.created"));
        let signed = sign_webhook(
            json!({ "userId": "123" }),
            SECRET,
            WebhookOptions { id: None, extra },
        )
        .expect("sign should succeed");
        assert!(signed.raw.contains(r#""type":"user.created""#));
        assert!(verify_webhook(&WebhookVerification {
            payload: &signed.raw,
            secret: SECRET,
            signature: &signed.signature,
        }));
    }

    #[test]
    fn tampered_data_field_fails_verification() {
        let signed = sign_webhook(json!({ "event": "x" }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        let tampered = signed.raw.replace(r#""event":"x""#, r#""event":"y""#);
        assert_ne!(tampered, signed.raw);
        assert!(!verify_webhook(&WebhookVerification {
            payload: &tampered,
            secret: SECRET,
            signature: &signed.signature,
        }));
    }

    #[test]
    fn tampered_id_fails_verification() {
        let options = WebhookOptions {
            id: Some("msg_a".into()),
            ..WebhookOptions::default()
        };
        let signed = sign_webhook(json!({ "n": 1 }), SECRET, options).expect("sign ok");
        let tampered = signed.raw.replace(r#""id":"msg_a""#, r#""id":"msg_b""#);
        assert!(!verify_webhook(&WebhookVerification {
            payload: &tampered,
            secret: SECRET,
            signature: &signed.signature,
        }));
    }

    #[test]
    fn tampered_timestamp_fails_verification() {
        let signed = sign_webhook(json!({ "n": 1 }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        let original = format!("\"timestamp\":{}", signed.payload.timestamp);
        let bumped = format!(
            "\"timestamp\":{}",
            signed.payload.timestamp.saturating_add(1)
        );
        let tampered = signed.raw.replace(&original, &bumped);
        assert_ne!(tampered, signed.raw);
        assert!(!verify_webhook(&WebhookVerification {
            payload: &tampered,
            secret: SECRET,
            signature: &signed.signature,
        }));
    }

    #[test]
    fn foreign_version_tag_fails_verification() {
        let signed = sign_webhook(json!({ "n": 1 }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        let foreign = signed.signature.replacen("v1,", "v2,", 1);
        assert!(!verify_webhook(&WebhookVerification {
            payload: &signed.raw,
            secret: SECRET,
            signature: &foreign,
        }));
    }

    #[test]
    fn untagged_signature_fails_verification() {
        let signed = sign_webhook(json!({ "n": 1 }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        let bare = signed
            .signature
            .strip_prefix("v1,")
            .expect("signature should carry the v1 tag");
        assert!(!verify_webhook(&WebhookVerification {
            payload: &signed.raw,
            secret: SECRET,
            signature: bare,
        }));
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let signed = sign_webhook(json!({ "n": 1 }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        assert!(!verify_webhook(&WebhookVerification {
            payload: &signed.raw,
            secret: "whsec_someOtherSecretEntirely000000",
            signature: &signed.signature,
        }));
    }

    #[test]
    fn malformed_secret_fails_verification_closed() {
        let signed = sign_webhook(json!({ "n": 1 }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        for bad_secret in ["", "whsec_", "no-prefix-at-all"] {
            assert!(!verify_webhook(&WebhookVerification {
                payload: &signed.raw,
                secret: bad_secret,
                signature: &signed.signature,
            }));
        }
    }

    #[test]
    fn unparsable_payload_fails_verification() {
        assert!(!verify_webhook(&WebhookVerification {
            payload: "not json",
            secret: SECRET,
            signature: "v1,00ff",
        }));
    }

    #[test]
    fn empty_secret_fails_to_sign() {
        let result = sign_webhook(json!({}), "", WebhookOptions::default());
        assert!(matches!(result, Err(CryptoError::InvalidSecret(_))));
    }

    #[test]
    fn unprefixed_secret_fails_to_sign() {
        let result = sign_webhook(json!({}), "rawsecret", WebhookOptions::default());
        assert!(matches!(result, Err(CryptoError::InvalidSecret(_))));
    }

    #[test]
    fn prefix_only_secret_fails_to_sign() {
        let result = sign_webhook(json!({}), "whsec_", WebhookOptions::default());
        assert!(matches!(result, Err(CryptoError::InvalidSecret(_))));
    }

    #[test]
    fn generated_secret_has_expected_shape() {
        let secret = generate_webhook_secret();
        let key = secret.strip_prefix("whsec_").expect("prefix should be present");
        assert_eq!(key.len(), 32);
        assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn verify_is_idempotent() {
        let signed = sign_webhook(json!({ "n": 1 }), SECRET, WebhookOptions::default())
            .expect("sign should succeed");
        let input = WebhookVerification {
            payload: &signed.raw,
            secret: SECRET,
            signature: &signed.signature,
        };
        for _ in 0..3 {
            assert!(verify_webhook(&input));
        }
    }
}
