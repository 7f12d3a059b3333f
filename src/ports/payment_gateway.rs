//! Payment gateway port.
//!
//! Contract for the external processor that holds payment intents. The
//! checkout flow only ever creates, inspects and cancels intents; the
//! shopper confirms them with the processor directly, so card data never
//! passes through here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::checkout::{PaymentInfo, PaymentIntent, PaymentIntentStatus};

pub use crate::domain::checkout::{PaymentError, PaymentErrorCode};

/// Port for payment processor integrations.
///
/// Implementations must honor `idempotency_key`: two creates with the same
/// key return the same intent.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent for the given amount.
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve_payment_intent(&self, intent_id: &str)
        -> Result<PaymentIntent, PaymentError>;

    /// Cancel an intent that has not been captured.
    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError>;

    /// Verify a webhook signature and parse the event.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError>;
}

/// Request to create a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentRequest {
    pub info: PaymentInfo,

    /// Key the processor uses to collapse retried creates.
    pub idempotency_key: Option<String>,

    pub description: Option<String>,

    /// Tracking number stored in the intent's metadata.
    pub order_tracking_number: Option<String>,
}

impl CreatePaymentIntentRequest {
    pub fn new(info: PaymentInfo) -> Self {
        Self {
            info,
            idempotency_key: None,
            description: None,
            order_tracking_number: None,
        }
    }

    /// Ties the intent to an order: the tracking number doubles as the
    /// idempotency key.
    pub fn for_order(info: PaymentInfo, tracking_number: &str) -> Self {
        Self {
            info,
            idempotency_key: Some(format!("order-{}", tracking_number)),
            description: Some(format!("Order {}", tracking_number)),
            order_tracking_number: Some(tracking_number.to_string()),
        }
    }
}

/// Webhook event from the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event ID from the processor (evt_...).
    pub id: String,

    pub event_type: WebhookEventType,

    pub data: WebhookEventData,

    /// Unix timestamp.
    pub created_at: i64,

    /// Untouched event body, kept for the ledger.
    pub raw: serde_json::Value,
}

/// Event types the checkout flow reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEventType {
    PaymentIntentSucceeded,

    PaymentIntentPaymentFailed,

    PaymentIntentCanceled,

    Unknown(String),
}

impl WebhookEventType {
    pub fn parse(s: &str) -> Self {
        match s {
            "payment_intent.succeeded" => Self::PaymentIntentSucceeded,
            "payment_intent.payment_failed" => Self::PaymentIntentPaymentFailed,
            "payment_intent.canceled" => Self::PaymentIntentCanceled,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentIntentSucceeded => "payment_intent.succeeded",
            Self::PaymentIntentPaymentFailed => "payment_intent.payment_failed",
            Self::PaymentIntentCanceled => "payment_intent.canceled",
            Self::Unknown(s) => s,
        }
    }
}

/// Webhook payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookEventData {
    #[serde(rename = "payment_intent")]
    PaymentIntent {
        intent_id: String,
        status: PaymentIntentStatus,
        amount: i64,
        currency: String,
        order_tracking_number: Option<String>,
        /// Processor's message for the last failed attempt.
        failure_message: Option<String>,
    },

    #[serde(rename = "raw")]
    Raw { json: String },
}
