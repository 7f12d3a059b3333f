//! In-process stand-in for the payment processor.
//!
//! Behaves like the real gateway where the checkout flow can tell the
//! difference: repeated creates with one idempotency key return the same
//! intent, cancelling moves an intent to `canceled`. Tests can queue
//! failures per method and inspect the call log.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::checkout::{PaymentIntent, PaymentIntentStatus};
use crate::ports::{
    CreatePaymentIntentRequest, PaymentError, PaymentGateway, WebhookEvent, WebhookEventData,
    WebhookEventType,
};

/// Mock payment gateway for tests and local runs without Stripe.
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    intents: HashMap<String, PaymentIntent>,

    /// Idempotency key -> intent id.
    idempotency: HashMap<String, String>,

    /// Failures returned once each, in order, per method.
    queued_errors: HashMap<&'static str, VecDeque<PaymentError>>,

    /// Failure returned on every call to a method.
    method_errors: HashMap<&'static str, PaymentError>,

    reject_webhooks: bool,

    next_id: u64,

    call_log: Vec<MethodCall>,
}

/// Recorded method call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCall {
    pub method: &'static str,
    pub arg: String,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// A gateway whose webhook verification always fails.
    pub fn rejecting_webhooks() -> Self {
        let mock = Self::new();
        mock.state().reject_webhooks = true;
        mock
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Configuration
    // ════════════════════════════════════════════════════════════════════════════

    /// Fail the next call to `method` with `error`. Queued failures are
    /// consumed one per call.
    pub fn fail_next(&self, method: &'static str, error: PaymentError) {
        self.state()
            .queued_errors
            .entry(method)
            .or_default()
            .push_back(error);
    }

    /// Fail every call to `method` until cleared.
    pub fn set_method_error(&self, method: &'static str, error: PaymentError) {
        self.state().method_errors.insert(method, error);
    }

    pub fn clear_errors(&self) {
        let mut state = self.state();
        state.queued_errors.clear();
        state.method_errors.clear();
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Inspection
    // ════════════════════════════════════════════════════════════════════════════

    pub fn calls(&self) -> Vec<MethodCall> {
        self.state().call_log.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.state()
            .call_log
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    pub fn intent(&self, intent_id: &str) -> Option<PaymentIntent> {
        self.state().intents.get(intent_id).cloned()
    }

    fn begin(&self, method: &'static str, arg: impl Into<String>) -> Result<(), PaymentError> {
        let mut state = self.state();
        state.call_log.push(MethodCall {
            method,
            arg: arg.into(),
        });
        if let Some(error) = state
            .queued_errors
            .get_mut(method)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        match state.method_errors.get(method) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Webhook builders
    // ════════════════════════════════════════════════════════════════════════════

    /// A verified-looking event for an intent.
    pub fn intent_event(
        event_id: &str,
        event_type: WebhookEventType,
        intent_id: &str,
        failure_message: Option<&str>,
    ) -> WebhookEvent {
        let status = match event_type {
            WebhookEventType::PaymentIntentSucceeded => PaymentIntentStatus::Succeeded,
            WebhookEventType::PaymentIntentCanceled => PaymentIntentStatus::Canceled,
            _ => PaymentIntentStatus::RequiresPaymentMethod,
        };
        let raw = serde_json::json!({
            "id": event_id,
            "type": event_type.as_str(),
            "data": {"object": {"id": intent_id}}
        });
        WebhookEvent {
            id: event_id.to_string(),
            event_type,
            data: WebhookEventData::PaymentIntent {
                intent_id: intent_id.to_string(),
                status,
                amount: 0,
                currency: "usd".to_string(),
                order_tracking_number: None,
                failure_message: failure_message.map(str::to_string),
            },
            created_at: chrono::Utc::now().timestamp(),
            raw,
        }
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        self.begin(
            "create_payment_intent",
            request.idempotency_key.clone().unwrap_or_default(),
        )?;

        let mut state = self.state();
        if let Some(existing) = request
            .idempotency_key
            .as_ref()
            .and_then(|key| state.idempotency.get(key))
            .and_then(|id| state.intents.get(id))
        {
            return Ok(existing.clone());
        }

        state.next_id += 1;
        let id = format!("pi_mock_{}", state.next_id);
        let intent = PaymentIntent {
            client_secret: Some(format!("{}_secret_mock", id)),
            id: id.clone(),
            amount: request.info.amount(),
            currency: request.info.currency().to_string(),
            status: PaymentIntentStatus::RequiresPaymentMethod,
            created: chrono::Utc::now().timestamp(),
        };
        if let Some(key) = request.idempotency_key {
            state.idempotency.insert(key, id.clone());
        }
        state.intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.begin("retrieve_payment_intent", intent_id)?;
        self.state()
            .intents
            .get(intent_id)
            .cloned()
            .ok_or_else(|| PaymentError::not_found("payment intent"))
    }

    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        self.begin("cancel_payment_intent", intent_id)?;
        let mut state = self.state();
        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::not_found("payment intent"))?;
        intent.status = PaymentIntentStatus::Canceled;
        Ok(intent.clone())
    }

    /// Accepts any signature and parses a minimal event body:
    /// `{"id", "type", "data": {"object": {"id", "last_payment_error"?}}}`.
    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        self.begin("verify_webhook", signature)?;
        if self.state().reject_webhooks {
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }

        let raw: serde_json::Value = serde_json::from_slice(payload)
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid JSON: {}", e)))?;
        let field = |v: &serde_json::Value| v.as_str().map(str::to_string);
        let event_id = field(&raw["id"])
            .ok_or_else(|| PaymentError::invalid_webhook("Missing event id"))?;
        let event_type = WebhookEventType::parse(raw["type"].as_str().unwrap_or_default());
        let object = &raw["data"]["object"];

        let mut event = match field(&object["id"]) {
            Some(intent_id) if !matches!(event_type, WebhookEventType::Unknown(_)) => {
                let failure = field(&object["last_payment_error"]["message"]);
                Self::intent_event(&event_id, event_type, &intent_id, failure.as_deref())
            }
            _ => WebhookEvent {
                id: event_id,
                event_type,
                data: WebhookEventData::Raw {
                    json: object.to_string(),
                },
                created_at: chrono::Utc::now().timestamp(),
                raw: serde_json::Value::Null,
            },
        };
        event.raw = raw;
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::{PaymentErrorCode, PaymentInfo};
    use crate::domain::foundation::Money;

    fn request(key: Option<&str>) -> CreatePaymentIntentRequest {
        let info = PaymentInfo::new(Money::from_cents(1000).unwrap(), "usd", None).unwrap();
        CreatePaymentIntentRequest {
            idempotency_key: key.map(str::to_string),
            ..CreatePaymentIntentRequest::new(info)
        }
    }

    #[tokio::test]
    async fn same_idempotency_key_returns_same_intent() {
        let mock = MockPaymentGateway::new();
        let a = mock.create_payment_intent(request(Some("k1"))).await.unwrap();
        let b = mock.create_payment_intent(request(Some("k1"))).await.unwrap();
        let c = mock.create_payment_intent(request(Some("k2"))).await.unwrap();

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(mock.call_count("create_payment_intent"), 3);
    }

    #[tokio::test]
    async fn queued_errors_are_consumed_in_order() {
        let mock = MockPaymentGateway::new();
        mock.fail_next("create_payment_intent", PaymentError::network("timeout"));

        let err = mock.create_payment_intent(request(None)).await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NetworkError);
        assert!(mock.create_payment_intent(request(None)).await.is_ok());
    }

    #[tokio::test]
    async fn method_error_persists_until_cleared() {
        let mock = MockPaymentGateway::new();
        mock.set_method_error("create_payment_intent", PaymentError::card_declined("no"));

        assert!(mock.create_payment_intent(request(None)).await.is_err());
        assert!(mock.create_payment_intent(request(None)).await.is_err());
        mock.clear_errors();
        assert!(mock.create_payment_intent(request(None)).await.is_ok());
    }

    #[tokio::test]
    async fn cancel_marks_intent_canceled() {
        let mock = MockPaymentGateway::new();
        let intent = mock.create_payment_intent(request(None)).await.unwrap();

        let cancelled = mock.cancel_payment_intent(&intent.id).await.unwrap();
        assert_eq!(cancelled.status, PaymentIntentStatus::Canceled);
        assert_eq!(
            mock.retrieve_payment_intent(&intent.id).await.unwrap().status,
            PaymentIntentStatus::Canceled
        );
    }

    #[tokio::test]
    async fn unknown_intent_is_not_found() {
        let mock = MockPaymentGateway::new();
        let err = mock.retrieve_payment_intent("pi_nope").await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NotFound);
    }

    #[tokio::test]
    async fn verify_webhook_parses_minimal_event() {
        let mock = MockPaymentGateway::new();
        let payload = br#"{"id":"evt_1","type":"payment_intent.payment_failed","data":{"object":{"id":"pi_1","last_payment_error":{"message":"declined"}}}}"#;

        let event = mock.verify_webhook(payload, "t=1,v1=00").await.unwrap();
        assert_eq!(event.event_type, WebhookEventType::PaymentIntentPaymentFailed);
        match event.data {
            WebhookEventData::PaymentIntent {
                intent_id,
                failure_message,
                ..
            } => {
                assert_eq!(intent_id, "pi_1");
                assert_eq!(failure_message.as_deref(), Some("declined"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(event.raw["id"], "evt_1");
    }

    #[tokio::test]
    async fn rejecting_mock_fails_verification() {
        let mock = MockPaymentGateway::rejecting_webhooks();
        let err = mock.verify_webhook(b"{}", "sig").await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }
}
