//! Stripe webhook verification and decoding.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>,v1=<hex>`.
//! Each `v1` is `HMAC-SHA256(secret, "<t>.<raw body>")`; the request is
//! accepted if any of them matches and `t` is within the tolerance window.

use chrono::Utc;
use estate_core::ports::BillingEvent;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

/// Header carrying the signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Maximum accepted age (and clock skew) of a signed payload.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Malformed signature header")]
    MalformedHeader,

    #[error("Timestamp outside the tolerance window")]
    TimestampOutOfTolerance,

    #[error("No signature matches the payload")]
    SignatureMismatch,

    #[error("Invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Signing
// ---------------------------------------------------------------------------

fn mac_for(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Hex-encoded `v1` signature of `payload` at `timestamp`.
pub fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let digest = mac_for(secret, timestamp, payload).finalize().into_bytes();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// A complete `Stripe-Signature` header value for `payload`.
pub fn signature_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    format!("t={timestamp},v1={}", sign(secret, timestamp, payload))
}

fn decode_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(s.get(i..i + 2)?, 16).ok())
        .collect()
}

struct ParsedHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_header(header: &str) -> Result<ParsedHeader, WebhookError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            // Entries that are not hex can never match.
            "v1" => signatures.extend(decode_hex(value)),
            _ => {}
        }
    }
    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(ParsedHeader {
            timestamp,
            signatures,
        }),
        _ => Err(WebhookError::MalformedHeader),
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    data: EnvelopeData,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: serde_json::Value,
}

fn str_field(object: &serde_json::Value, field: &str) -> Option<String> {
    object.get(field)?.as_str().map(str::to_string)
}

/// Decode a verified payload. `Ok(None)` for event kinds the platform does
/// not act on, and for invoice events not tied to a subscription.
pub fn decode_event(payload: &[u8]) -> Result<Option<BillingEvent>, WebhookError> {
    let envelope: Envelope = serde_json::from_slice(payload)?;
    let object = &envelope.data.object;

    let event = match envelope.kind.as_str() {
        "customer.subscription.updated" => {
            match (str_field(object, "id"), str_field(object, "status")) {
                (Some(subscription_id), Some(status)) => Some(BillingEvent::SubscriptionUpdated {
                    subscription_id,
                    status,
                }),
                _ => None,
            }
        }
        "customer.subscription.deleted" => str_field(object, "id")
            .map(|subscription_id| BillingEvent::SubscriptionDeleted { subscription_id }),
        "invoice.payment_succeeded" | "invoice.paid" => str_field(object, "subscription")
            .map(|subscription_id| BillingEvent::InvoicePaid { subscription_id }),
        "invoice.payment_failed" => str_field(object, "subscription")
            .map(|subscription_id| BillingEvent::InvoicePaymentFailed { subscription_id }),
        _ => None,
    };
    Ok(event)
}

// ---------------------------------------------------------------------------
// Verifier
// ---------------------------------------------------------------------------

/// Verifies and decodes incoming webhooks for one signing secret.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    /// Check the signature header against the raw body at time `now`.
    pub fn verify_at(&self, payload: &[u8], header: &str, now: i64) -> Result<(), WebhookError> {
        let parsed = parse_header(header)?;
        if now.abs_diff(parsed.timestamp) > self.tolerance_secs.unsigned_abs() {
            return Err(WebhookError::TimestampOutOfTolerance);
        }
        let matched = parsed.signatures.iter().any(|candidate| {
            mac_for(&self.secret, parsed.timestamp, payload)
                .verify_slice(candidate)
                .is_ok()
        });
        if matched {
            Ok(())
        } else {
            Err(WebhookError::SignatureMismatch)
        }
    }

    /// Verify against the current clock, then decode.
    pub fn construct_event(
        &self,
        payload: &[u8],
        header: &str,
    ) -> Result<Option<BillingEvent>, WebhookError> {
        self.verify_at(payload, header, Utc::now().timestamp())?;
        decode_event(payload)
    }
}
