//! Webhook signature verification and payload parsing.
//!
//! The gateway signs every webhook delivery with a shared secret. The signature header carries a
//! unix timestamp and an HMAC-SHA256 over `"{timestamp}.{raw body}"`, hex-encoded:
//!
//! ```text
//! Gateway-Signature: t=1712345678,v1=5257a869e7...
//! ```
//!
//! Verification is mandatory before the payload is interpreted in any way. A payload that fails
//! verification must be rejected outright.
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

use crate::{data_objects::SessionId, helpers::from_hex};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Gateway-Signature";

#[derive(Debug, Clone, Error)]
pub enum SignatureError {
    #[error("The signature header is malformed. {0}")]
    MalformedHeader(String),
    #[error("The signature does not match the payload.")]
    Mismatch,
}

/// Verifies the signature header against the raw request body.
pub fn verify_signature(secret: &str, header: &str, payload: &[u8]) -> Result<(), SignatureError> {
    let (timestamp, signature) = parse_signature_header(header)?;
    let signature =
        from_hex(&signature).ok_or_else(|| SignatureError::MalformedHeader("v1 is not valid hex".to_string()))?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| SignatureError::MalformedHeader(e.to_string()))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    // verify_slice is constant-time
    mac.verify_slice(&signature).map_err(|_| SignatureError::Mismatch)
}

fn parse_signature_header(header: &str) -> Result<(String, String), SignatureError> {
    let mut timestamp = None;
    let mut signature = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", v)) => timestamp = Some(v.to_string()),
            Some(("v1", v)) => signature = Some(v.to_string()),
            _ => {},
        }
    }
    match (timestamp, signature) {
        (Some(t), Some(v1)) => Ok((t, v1)),
        (None, _) => Err(SignatureError::MalformedHeader("missing timestamp (t=)".to_string())),
        (_, None) => Err(SignatureError::MalformedHeader("missing signature (v1=)".to_string())),
    }
}

/// Signs a payload the way the gateway does. Used to build outgoing test fixtures.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let data = [timestamp.to_string().as_bytes(), b".", payload].concat();
    let mac = crate::helpers::calculate_hmac(secret, &data);
    format!("t={timestamp},v1={mac}")
}

//--------------------------------------    WebhookEvent     ---------------------------------------------------------
/// The gateway events this system consumes. Everything else lands in `Other` and is acknowledged
/// without effect; adding a new handled event type means adding an arm here, so unhandled types
/// are visible at compile time rather than silently dropped in a string-keyed dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// The customer completed the hosted checkout and payment succeeded.
    CheckoutCompleted { session_id: SessionId },
    /// The checkout session expired before the customer paid.
    CheckoutExpired { session_id: SessionId },
    /// An asynchronous payment method failed after checkout completed.
    PaymentFailed { session_id: SessionId },
    /// Any event type this system does not consume.
    Other { event_type: String },
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: RawEventObject,
}

#[derive(Deserialize)]
struct RawEventObject {
    id: String,
}

impl WebhookEvent {
    /// Parses a verified webhook payload. Call [`verify_signature`] first.
    pub fn from_payload(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let raw: RawEvent = serde_json::from_slice(payload)?;
        let session_id = SessionId(raw.data.object.id);
        let event = match raw.event_type.as_str() {
            "checkout.session.completed" => Self::CheckoutCompleted { session_id },
            "checkout.session.expired" => Self::CheckoutExpired { session_id },
            "checkout.session.async_payment_failed" => Self::PaymentFailed { session_id },
            _ => Self::Other { event_type: raw.event_type },
        };
        Ok(event)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    fn completed_payload() -> Vec<u8> {
        serde_json::json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_test_123", "client_reference_id": "BK-1" } }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn valid_signature_passes() {
        let payload = completed_payload();
        let header = sign_payload(SECRET, 1712345678, &payload);
        verify_signature(SECRET, &header, &payload).expect("signature should verify");
    }

    #[test]
    fn tampered_payload_fails() {
        let payload = completed_payload();
        let header = sign_payload(SECRET, 1712345678, &payload);
        let mut tampered = payload.clone();
        tampered[0] ^= 0x01;
        assert!(matches!(verify_signature(SECRET, &header, &tampered), Err(SignatureError::Mismatch)));
    }

    #[test]
    fn wrong_secret_fails() {
        let payload = completed_payload();
        let header = sign_payload("whsec_other", 1712345678, &payload);
        assert!(matches!(verify_signature(SECRET, &header, &payload), Err(SignatureError::Mismatch)));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let payload = completed_payload();
        assert!(matches!(
            verify_signature(SECRET, "v1=abcd", &payload),
            Err(SignatureError::MalformedHeader(_))
        ));
        assert!(matches!(
            verify_signature(SECRET, "t=123", &payload),
            Err(SignatureError::MalformedHeader(_))
        ));
        assert!(matches!(
            verify_signature(SECRET, "t=123,v1=zzzz", &payload),
            Err(SignatureError::MalformedHeader(_))
        ));
    }

    #[test]
    fn known_events_parse() {
        let event = WebhookEvent::from_payload(&completed_payload()).unwrap();
        assert_eq!(event, WebhookEvent::CheckoutCompleted { session_id: "cs_test_123".into() });
    }

    #[test]
    fn unknown_event_types_fall_through_to_other() {
        let payload = serde_json::json!({
            "type": "invoice.created",
            "data": { "object": { "id": "in_1" } }
        })
        .to_string();
        let event = WebhookEvent::from_payload(payload.as_bytes()).unwrap();
        assert_eq!(event, WebhookEvent::Other { event_type: "invoice.created".to_string() });
    }
}
