//! # Stripe Client
//!
//! Webhook signature verification and payment-intent identifier handling.
//!
//! ## Signature Scheme
//! ```text
//! Stripe-Signature: t=<unix-ts>,v1=<hex hmac>[,v1=<hex hmac>...]
//!
//! signed_payload = "<t>.<raw body bytes>"
//! expected       = HMAC-SHA256(webhook_secret, signed_payload)
//!
//! A signature only verifies when some v1 entry matches AND the timestamp
//! is within the replay tolerance (5 minutes).
//! ```
//!
//! Verification failures are the one webhook path that must never touch
//! state: the handler returns 400 before the reconciler sees the event.
//!
//! The actual money movement lives with the processor; this engine only
//! issues and stores the intent identifiers the front end needs.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Replay tolerance for the signature timestamp, in seconds.
const TIMESTAMP_TOLERANCE_SECS: i64 = 300;

/// Errors for a malformed `Stripe-Signature` header.
///
/// Distinct from a *wrong* signature: a malformed header is an Err, a
/// well-formed header that doesn't verify is `Ok(false)`.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("Stripe-Signature header is missing the timestamp")]
    MissingTimestamp,

    #[error("Stripe-Signature header is missing the v1 signature")]
    MissingSignature,

    #[error("Stripe-Signature timestamp is not a number")]
    MalformedTimestamp,
}

/// Stripe integration client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    webhook_secret: String,
}

impl StripeClient {
    /// Creates a client with the configured webhook signing secret.
    pub fn new(webhook_secret: impl Into<String>) -> Self {
        StripeClient {
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Verifies a webhook signature against the raw request body.
    ///
    /// Returns `Ok(true)` for a valid signature, `Ok(false)` for a wrong or
    /// stale one, and `Err` for a header that doesn't parse at all.
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<bool, SignatureError> {
        let mut timestamp: Option<&str> = None;
        let mut candidates: Vec<&str> = Vec::new();

        for part in signature_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => candidates.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureError::MissingTimestamp)?;
        if candidates.is_empty() {
            return Err(SignatureError::MissingSignature);
        }

        let timestamp: i64 = timestamp
            .parse()
            .map_err(|_| SignatureError::MalformedTimestamp)?;

        // Reject replays: the processor signs with the delivery time.
        let age = chrono::Utc::now().timestamp() - timestamp;
        if age.abs() > TIMESTAMP_TOLERANCE_SECS {
            return Ok(false);
        }

        for candidate in candidates {
            let Ok(signature) = hex::decode(candidate) else {
                continue;
            };

            let mut mac = HmacSha256::new_from_slice(self.webhook_secret.as_bytes())
                .expect("HMAC can take key of any size");
            mac.update(timestamp.to_string().as_bytes());
            mac.update(b".");
            mac.update(payload);

            // constant-time comparison
            if mac.verify_slice(&signature).is_ok() {
                return Ok(true);
            }
        }

        Ok(false)
    }
}

/// Issues a new payment-intent id in the processor's format.
pub fn new_payment_intent_id() -> String {
    format!("pi_{}", Uuid::new_v4().simple())
}

/// Issues the client secret paired with an intent id.
pub fn new_client_secret(payment_intent_id: &str) -> String {
    format!("{}_secret_{}", payment_intent_id, Uuid::new_v4().simple())
}

// =============================================================================
// Unit Tests
// =============================================================================
