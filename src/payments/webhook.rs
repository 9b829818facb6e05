//! Verification and decoding of gateway webhook deliveries.
//!
//! The `Stripe-Signature` header looks like `t=1700000000,v1=<hex>[,v1=<hex>]`;
//! each `v1` is an HMAC-SHA256 of `"{t}.{raw body}"` keyed with the endpoint
//! secret.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing or malformed signature header")]
    MalformedHeader,

    #[error("signature timestamp outside the tolerance window")]
    Expired,

    #[error("no signature matches the payload")]
    BadSignature,

    #[error("malformed event payload: {0}")]
    MalformedEvent(String),
}

/// Checks a delivery against the shared secret.
pub fn verify_signature(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), WebhookError> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(WebhookError::MalformedHeader);
    }
    // `t` is attacker-controlled; `abs_diff` cannot overflow.
    if now.abs_diff(timestamp) > tolerance_secs.max(0).unsigned_abs() {
        return Err(WebhookError::Expired);
    }

    let mac = signing_mac(secret, timestamp, payload)?;
    let matches = signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
    if matches {
        Ok(())
    } else {
        Err(WebhookError::BadSignature)
    }
}

/// Header value the gateway would send for `payload` at `timestamp`.
pub fn sign(payload: &[u8], secret: &str, timestamp: i64) -> Result<String, WebhookError> {
    let mac = signing_mac(secret, timestamp, payload)?;
    Ok(format!(
        "t={timestamp},v1={}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signing_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, WebhookError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| WebhookError::BadSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct SessionObject {
    id: String,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    CheckoutCompleted {
        event_id: String,
        session_id: String,
        cart_id: Uuid,
        user_id: Uuid,
    },
    /// Anything the storefront does not act on.
    Ignored { event_id: String, kind: String },
}

pub fn parse_event(payload: &[u8]) -> Result<PaymentEvent, WebhookError> {
    let envelope: EventEnvelope = serde_json::from_slice(payload)
        .map_err(|e| WebhookError::MalformedEvent(e.to_string()))?;

    let completes_payment = matches!(
        envelope.kind.as_str(),
        "checkout.session.completed" | "checkout.session.async_payment_succeeded"
    );
    if !completes_payment {
        return Ok(PaymentEvent::Ignored {
            event_id: envelope.id,
            kind: envelope.kind,
        });
    }

    let session: SessionObject = serde_json::from_value(envelope.data.object)
        .map_err(|e| WebhookError::MalformedEvent(e.to_string()))?;

    // Delayed payment methods complete the session before the money arrives.
    if session.payment_status.as_deref() == Some("unpaid") {
        return Ok(PaymentEvent::Ignored {
            event_id: envelope.id,
            kind: envelope.kind,
        });
    }

    let metadata_id = |key: &str| -> Result<Uuid, WebhookError> {
        session
            .metadata
            .get(key)
            .and_then(|raw| Uuid::parse_str(raw).ok())
            .ok_or_else(|| WebhookError::MalformedEvent(format!("metadata.{key} is missing")))
    };

    Ok(PaymentEvent::CheckoutCompleted {
        event_id: envelope.id,
        cart_id: metadata_id("cart_id")?,
        user_id: metadata_id("user_id")?,
        session_id: session.id,
    })
}
