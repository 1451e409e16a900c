//! # Stripe Webhook Handling
//!
//! `Stripe-Signature` verification and normalization of Stripe events into
//! [`WebhookEvent`].
//!
//! The header looks like `t=1700000000,v1=<hex>,v1=<hex>`. Each `v1` is an
//! HMAC-SHA256 of `"{t}.{raw body}"` keyed with the endpoint's signing
//! secret.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rental_core::{Currency, RentalError, RentalResult, WebhookEvent, WebhookEventType};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::Sha256;
use std::collections::HashMap;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed delivery, in seconds
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Events the storefront endpoint should subscribe to
pub const REQUIRED_WEBHOOK_EVENTS: &[&str] = &[
    "checkout.session.completed",
    "checkout.session.expired",
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
    "charge.refunded",
];

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> RentalResult<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse().ok(),
            "v1" => signatures.push(value.to_string()),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        RentalError::WebhookVerificationFailed("Missing timestamp in signature".to_string())
    })?;

    if signatures.is_empty() {
        return Err(RentalError::WebhookVerificationFailed(
            "No v1 signature found".to_string(),
        ));
    }

    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

fn compute_hmac_sha256(secret: &str, timestamp: i64, payload: &[u8]) -> RentalResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| RentalError::Configuration(format!("invalid webhook secret: {}", e)))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes().zip(b.bytes()).fold(0, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Check `header` against `payload` at time `now`
pub fn verify_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
    now: DateTime<Utc>,
) -> RentalResult<()> {
    let parsed = parse_signature_header(header)?;

    if (now.timestamp() - parsed.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(RentalError::WebhookVerificationFailed(
            "Timestamp outside tolerance".to_string(),
        ));
    }

    let expected = compute_hmac_sha256(secret, parsed.timestamp, payload)?;
    if parsed
        .signatures
        .iter()
        .any(|sig| constant_time_compare(sig, &expected))
    {
        Ok(())
    } else {
        Err(RentalError::WebhookVerificationFailed(
            "Signature mismatch".to_string(),
        ))
    }
}

/// Build a `Stripe-Signature` header for `payload`. Used by tests and local
/// tooling that replays events.
pub fn sign_payload(secret: &str, payload: &[u8], timestamp: i64) -> RentalResult<String> {
    let sig = compute_hmac_sha256(secret, timestamp, payload)?;
    Ok(format!("t={},v1={}", timestamp, sig))
}

#[derive(Debug, Deserialize)]
struct StripeWebhookEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    created: i64,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: Map<String, Value>,
}

fn event_type(name: &str) -> WebhookEventType {
    match name {
        "checkout.session.completed" => WebhookEventType::CheckoutCompleted,
        "checkout.session.expired" => WebhookEventType::CheckoutExpired,
        "payment_intent.succeeded" => WebhookEventType::PaymentSucceeded,
        "payment_intent.payment_failed" => WebhookEventType::PaymentFailed,
        "charge.refunded" => WebhookEventType::RefundIssued,
        other => WebhookEventType::Unknown(other.to_string()),
    }
}

fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

/// Parse a verified Stripe event body
pub fn parse_event(payload: &[u8]) -> RentalResult<WebhookEvent> {
    let event: StripeWebhookEvent = serde_json::from_slice(payload)
        .map_err(|e| RentalError::WebhookParse(format!("Failed to parse webhook: {}", e)))?;

    debug!(event_type = %event.event_type, "Parsing Stripe webhook");

    let obj = &event.data.object;
    let metadata: HashMap<String, String> = obj
        .get("metadata")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default();

    let mut normalized = WebhookEvent::new(&event.id, event_type(&event.event_type), "stripe");
    normalized.session_id = str_field(obj, "id").filter(|id| id.starts_with("cs_"));
    normalized.payment_intent_id = str_field(obj, "payment_intent").or_else(|| {
        str_field(obj, "id").filter(|id| id.starts_with("pi_"))
    });
    normalized.payment_status = str_field(obj, "payment_status");
    normalized.customer_email = obj
        .get("customer_details")
        .and_then(|cd| cd.get("email"))
        .and_then(Value::as_str)
        .map(String::from);
    normalized.amount_paid = obj
        .get("amount_total")
        .or_else(|| obj.get("amount_received"))
        .and_then(Value::as_i64);
    normalized.currency = str_field(obj, "currency").and_then(|c| c.parse::<Currency>().ok());
    normalized.metadata = metadata;
    normalized.timestamp = DateTime::from_timestamp(event.created, 0).unwrap_or_else(Utc::now);
    normalized.raw_data = Some(Value::Object(event.data.object));

    Ok(normalized)
}
