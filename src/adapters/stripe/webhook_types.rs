//! Stripe wire types: the signature header, event envelopes, payment intent
//! objects and API error bodies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════════
// Signature Header
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureParseError {
    #[error("missing Stripe-Signature header")]
    MissingHeader,

    #[error("missing timestamp (t=) in signature")]
    MissingTimestamp,

    #[error("missing v1 signature in header")]
    MissingV1Signature,

    #[error("invalid timestamp format")]
    InvalidTimestamp,

    #[error("signature is not valid hex")]
    InvalidSignatureFormat,
}

/// Parsed `Stripe-Signature` header: `t=<unix>,v1=<hex>[,v1=<hex>...]`.
///
/// Stripe sends one `v1` entry per active signing secret, so during secret
/// rotation there can be several.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, SignatureParseError> {
        let header = header.trim();
        if header.is_empty() {
            return Err(SignatureParseError::MissingHeader);
        }

        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.split_once('=') else {
                continue;
            };
            match key.trim() {
                "t" => {
                    let parsed = value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| SignatureParseError::InvalidTimestamp)?;
                    timestamp = Some(parsed);
                }
                "v1" => {
                    let bytes =
                        hex_decode(value).ok_or(SignatureParseError::InvalidSignatureFormat)?;
                    v1_signatures.push(bytes);
                }
                // v0 and future schemes
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(SignatureParseError::MissingTimestamp)?;
        if v1_signatures.is_empty() {
            return Err(SignatureParseError::MissingV1Signature);
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }
}

pub(crate) fn hex_decode(hex: &str) -> Option<Vec<u8>> {
    let hex = hex.trim();
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok())
        .collect()
}

pub(crate) fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

// ════════════════════════════════════════════════════════════════════════════════
// Events
// ════════════════════════════════════════════════════════════════════════════════

/// Event envelope as posted to the webhook endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeWebhookEvent {
    pub id: String,

    #[serde(rename = "type")]
    pub event_type: String,

    pub created: i64,

    pub data: StripeEventData,

    #[serde(default)]
    pub livemode: bool,

    #[serde(default)]
    pub api_version: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment Intents
// ════════════════════════════════════════════════════════════════════════════════

/// `payment_intent` object returned by the API and embedded in events.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentIntent {
    pub id: String,

    #[serde(default)]
    pub client_secret: Option<String>,

    pub amount: i64,

    pub currency: String,

    pub status: String,

    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub metadata: HashMap<String, String>,

    #[serde(default)]
    pub last_payment_error: Option<StripeApiError>,
}

impl StripePaymentIntent {
    pub fn order_tracking_number(&self) -> Option<&str> {
        self.metadata.get("order_tracking_number").map(String::as_str)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════════

/// Body of a non-2xx API response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorBody {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeApiError {
    /// `card_error`, `invalid_request_error`, `api_error`, `idempotency_error`...
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,

    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub decline_code: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}
