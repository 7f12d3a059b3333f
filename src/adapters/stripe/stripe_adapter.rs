//! Stripe payment gateway adapter.
//!
//! Implements `PaymentGateway` over the Stripe REST API: payment intent
//! creation, retrieval and cancellation, and webhook verification.
//!
//! # Security
//!
//! - HMAC-SHA256 signature verification with constant-time comparison
//! - Timestamp validation (5-minute window) against replayed webhooks
//! - API key and signing secret held as `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key, webhook_secret);
//! let adapter = StripePaymentAdapter::new(config);
//! ```

use std::time::Duration;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::PaymentConfig;
use crate::domain::checkout::{PaymentIntent, PaymentIntentStatus};
use crate::domain::foundation::Money;
use crate::ports::{
    CreatePaymentIntentRequest, PaymentError, PaymentErrorCode, PaymentGateway, WebhookEvent,
    WebhookEventData, WebhookEventType,
};

use super::webhook_types::{
    hex_encode, SignatureHeader, StripeErrorBody, StripePaymentIntent, StripeWebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook events (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps.
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Webhook signing secret (whsec_...).
    webhook_secret: SecretString,

    api_base_url: String,

    /// Reject test-mode events.
    require_livemode: bool,

    request_timeout: Duration,
}

impl StripeConfig {
    pub fn new(api_key: impl Into<String>, webhook_secret: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            webhook_secret: SecretString::new(webhook_secret.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            require_livemode: false,
            request_timeout: Duration::from_secs(8),
        }
    }

    /// Point at a different API host (stripe-mock, a local fake).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl StripeConfig {
    /// Builds the adapter config from the `payment` section, or `None` when
    /// the Stripe keys are not set.
    pub fn from_payment_config(config: &PaymentConfig) -> Option<Self> {
        let api_key = config.stripe_api_key.clone()?;
        let webhook_secret = config.stripe_webhook_secret.clone()?;
        Some(Self {
            api_key,
            webhook_secret,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            require_livemode: config.require_livemode,
            request_timeout: config.request_timeout(),
        })
    }
}

/// Stripe payment gateway adapter.
pub struct StripePaymentAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripePaymentAdapter {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Sends a prepared request and decodes a payment intent from the reply.
    async fn send_for_intent(
        &self,
        request: reqwest::RequestBuilder,
        operation: &'static str,
    ) -> Result<PaymentIntent, PaymentError> {
        let response = request
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(operation, error = %e, "Stripe request failed to complete");
                PaymentError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = translate_error(status, &body);
            tracing::error!(
                operation,
                status = status.as_u16(),
                code = %error.code,
                provider_code = ?error.provider_code,
                "Stripe API error"
            );
            return Err(error);
        }

        let intent: StripePaymentIntent = response.json().await.map_err(|e| {
            PaymentError::provider(format!("Failed to parse Stripe response: {}", e))
        })?;
        intent_from_stripe(intent)
    }

    /// Verify webhook signature using HMAC-SHA256.
    fn verify_signature(&self, payload: &[u8], header: &SignatureHeader) -> Result<(), PaymentError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - header.timestamp;

        if age > MAX_TIMESTAMP_AGE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                age_secs = age,
                "Webhook event too old - possible replay"
            );
            return Err(PaymentError::invalid_webhook(format!(
                "Event too old ({} seconds)",
                age
            )));
        }
        if age < -MAX_FUTURE_TOLERANCE_SECS {
            tracing::warn!(
                event_timestamp = header.timestamp,
                current_time = now,
                "Webhook event timestamp in the future"
            );
            return Err(PaymentError::invalid_webhook("Event timestamp in future"));
        }

        let mut mac = HmacSha256::new_from_slice(self.config.webhook_secret.expose_secret().as_bytes())
            .map_err(|_| PaymentError::invalid_webhook("Unusable webhook secret"))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        let expected = mac.finalize().into_bytes();

        let matched = header
            .v1_signatures
            .iter()
            .any(|candidate| bool::from(expected.as_slice().ct_eq(candidate.as_slice())));

        if !matched {
            tracing::warn!(
                expected_signature = hex_encode(expected.as_slice()),
                "Invalid webhook signature"
            );
            return Err(PaymentError::invalid_webhook("Invalid signature"));
        }
        Ok(())
    }

    /// Parse a verified payload into the port's event type.
    fn parse_event(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentError> {
        let raw: serde_json::Value = serde_json::from_slice(payload).map_err(|e| {
            tracing::warn!(error = %e, "Failed to parse webhook payload");
            PaymentError::invalid_webhook(format!("Invalid JSON: {}", e))
        })?;
        let event: StripeWebhookEvent = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::invalid_webhook(format!("Invalid event: {}", e)))?;

        if self.config.require_livemode && !event.livemode {
            tracing::warn!(event_id = %event.id, "Rejected test mode event");
            return Err(PaymentError::invalid_webhook(
                "Test mode events not allowed in production",
            ));
        }

        let event_type = WebhookEventType::parse(&event.event_type);
        let data = if event.event_type.starts_with("payment_intent.") {
            let intent: StripePaymentIntent = serde_json::from_value(event.data.object.clone())
                .map_err(|e| {
                    PaymentError::invalid_webhook(format!("Invalid payment intent: {}", e))
                })?;
            WebhookEventData::PaymentIntent {
                order_tracking_number: intent.order_tracking_number().map(str::to_string),
                failure_message: intent
                    .last_payment_error
                    .as_ref()
                    .and_then(|err| err.message.clone()),
                status: PaymentIntentStatus::parse(&intent.status),
                intent_id: intent.id,
                amount: intent.amount,
                currency: intent.currency,
            }
        } else {
            WebhookEventData::Raw {
                json: event.data.object.to_string(),
            }
        };

        Ok(WebhookEvent {
            id: event.id,
            event_type,
            data,
            created_at: event.created,
            raw,
        })
    }
}

/// Converts the API's intent object into the domain type.
fn intent_from_stripe(intent: StripePaymentIntent) -> Result<PaymentIntent, PaymentError> {
    let amount = Money::from_cents(intent.amount)
        .map_err(|e| PaymentError::provider(format!("Invalid intent amount: {}", e)))?;
    Ok(PaymentIntent {
        status: PaymentIntentStatus::parse(&intent.status),
        id: intent.id,
        client_secret: intent.client_secret,
        amount,
        currency: intent.currency,
        created: intent.created,
    })
}

/// Maps a non-2xx Stripe response to a local error kind.
///
/// The decline or error code Stripe reported is kept as `provider_code`.
pub(crate) fn translate_error(status: StatusCode, body: &str) -> PaymentError {
    let detail = serde_json::from_str::<StripeErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_default();

    let code = match (
        status.as_u16(),
        detail.error_type.as_deref(),
        detail.code.as_deref(),
        detail.decline_code.as_deref(),
    ) {
        (_, _, Some("insufficient_funds"), _) | (_, _, _, Some("insufficient_funds")) => {
            PaymentErrorCode::InsufficientFunds
        }
        (_, _, Some("expired_card"), _) => PaymentErrorCode::CardExpired,
        (
            _,
            _,
            Some(
                "incorrect_number" | "invalid_number" | "incorrect_cvc" | "invalid_cvc"
                | "invalid_expiry_month" | "invalid_expiry_year",
            ),
            _,
        ) => PaymentErrorCode::InvalidCard,
        (_, Some("card_error"), _, _) | (_, _, Some("card_declined"), _) => {
            PaymentErrorCode::CardDeclined
        }
        (401, _, _, _) => PaymentErrorCode::AuthenticationError,
        (404, _, _, _) | (_, _, Some("resource_missing"), _) => PaymentErrorCode::NotFound,
        (429, _, _, _) => PaymentErrorCode::RateLimitExceeded,
        (_, Some("idempotency_error"), _, _) => PaymentErrorCode::IdempotencyConflict,
        (500..=599, _, _, _) => PaymentErrorCode::ProviderUnavailable,
        (400, _, _, _) | (_, Some("invalid_request_error"), _, _) => {
            PaymentErrorCode::InvalidRequest
        }
        _ => PaymentErrorCode::ProviderError,
    };

    let message = detail
        .message
        .unwrap_or_else(|| format!("Stripe returned HTTP {}", status.as_u16()));
    let error = PaymentError::new(code, message);
    match detail.decline_code.or(detail.code) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

#[async_trait]
impl PaymentGateway for StripePaymentAdapter {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let mut params = vec![
            ("amount", request.info.amount().cents().to_string()),
            ("currency", request.info.currency().to_string()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];
        if let Some(email) = request.info.receipt_email() {
            params.push(("receipt_email", email.to_string()));
        }
        if let Some(description) = &request.description {
            params.push(("description", description.clone()));
        }
        if let Some(tracking) = &request.order_tracking_number {
            params.push(("metadata[order_tracking_number]", tracking.clone()));
        }

        let mut http = self
            .http_client
            .post(self.url("/v1/payment_intents"))
            .form(&params);
        if let Some(key) = &request.idempotency_key {
            http = http.header("Idempotency-Key", key);
        }

        let intent = self.send_for_intent(http, "create_payment_intent").await?;
        tracing::info!(
            intent_id = %intent.id,
            amount = intent.amount.cents(),
            currency = %intent.currency,
            "Payment intent created"
        );
        Ok(intent)
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let http = self
            .http_client
            .get(self.url(&format!("/v1/payment_intents/{}", intent_id)));
        self.send_for_intent(http, "retrieve_payment_intent").await
    }

    async fn cancel_payment_intent(&self, intent_id: &str) -> Result<PaymentIntent, PaymentError> {
        let http = self
            .http_client
            .post(self.url(&format!("/v1/payment_intents/{}/cancel", intent_id)));
        let intent = self.send_for_intent(http, "cancel_payment_intent").await?;
        tracing::info!(intent_id = %intent.id, "Payment intent cancelled");
        Ok(intent)
    }

    async fn verify_webhook(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<WebhookEvent, PaymentError> {
        let header = SignatureHeader::parse(signature)
            .map_err(|e| PaymentError::invalid_webhook(e.to_string()))?;
        self.verify_signature(payload, &header)?;
        self.parse_event(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::PaymentInfo;
    use axum::extract::{Path, State};
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    const SECRET: &str = "whsec_test_secret";

    fn test_config() -> StripeConfig {
        StripeConfig::new("sk_test_123", SECRET)
    }

    fn sign(secret: &str, timestamp: i64, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{}.{}", timestamp, payload).as_bytes());
        let signature = hex_encode(&mac.finalize().into_bytes());
        format!("t={},v1={}", timestamp, signature)
    }

    fn intent_event(event_type: &str) -> String {
        serde_json::json!({
            "id": "evt_1",
            "type": event_type,
            "created": 1704067200,
            "livemode": false,
            "data": {
                "object": {
                    "id": "pi_1",
                    "object": "payment_intent",
                    "amount": 4298,
                    "currency": "usd",
                    "status": "requires_payment_method",
                    "metadata": {"order_tracking_number": "trk-1"},
                    "last_payment_error": {"type": "card_error", "message": "Your card was declined."}
                }
            }
        })
        .to_string()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn accepts_valid_signature() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = intent_event("payment_intent.succeeded");
        let header = sign(SECRET, chrono::Utc::now().timestamp(), &payload);

        let event = adapter.verify_webhook(payload.as_bytes(), &header).await.unwrap();
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, WebhookEventType::PaymentIntentSucceeded);
    }

    #[tokio::test]
    async fn accepts_any_matching_v1_during_rotation() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = intent_event("payment_intent.succeeded");
        let now = chrono::Utc::now().timestamp();
        let good = sign(SECRET, now, &payload);
        let stale = sign("whsec_old", now, &payload);
        let header = format!("{},v1={}", stale, good.split("v1=").nth(1).unwrap());

        assert!(adapter.verify_webhook(payload.as_bytes(), &header).await.is_ok());
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = intent_event("payment_intent.succeeded");
        let header = sign("whsec_other", chrono::Utc::now().timestamp(), &payload);

        let err = adapter.verify_webhook(payload.as_bytes(), &header).await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::InvalidWebhook);
    }

    #[tokio::test]
    async fn rejects_tampered_payload() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = intent_event("payment_intent.succeeded");
        let header = sign(SECRET, chrono::Utc::now().timestamp(), &payload);
        let tampered = payload.replace("4298", "1");

        assert!(adapter.verify_webhook(tampered.as_bytes(), &header).await.is_err());
    }

    #[test]
    fn rejects_old_timestamp() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let old = chrono::Utc::now().timestamp() - 400;
        let header = SignatureHeader::parse(&sign(SECRET, old, payload)).unwrap();

        let err = adapter.verify_signature(payload.as_bytes(), &header).unwrap_err();
        assert!(err.message.contains("too old"));
    }

    #[test]
    fn rejects_far_future_timestamp() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let future = chrono::Utc::now().timestamp() + 120;
        let header = SignatureHeader::parse(&sign(SECRET, future, payload)).unwrap();

        let err = adapter.verify_signature(payload.as_bytes(), &header).unwrap_err();
        assert!(err.message.contains("future"));
    }

    #[test]
    fn tolerates_small_clock_skew() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_test"}"#;
        let soon = chrono::Utc::now().timestamp() + 30;
        let header = SignatureHeader::parse(&sign(SECRET, soon, payload)).unwrap();

        assert!(adapter.verify_signature(payload.as_bytes(), &header).is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Event Parsing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn parses_payment_failed_intent() {
        let adapter = StripePaymentAdapter::new(test_config());
        let event = adapter
            .parse_event(intent_event("payment_intent.payment_failed").as_bytes())
            .unwrap();

        assert_eq!(event.event_type, WebhookEventType::PaymentIntentPaymentFailed);
        match event.data {
            WebhookEventData::PaymentIntent {
                intent_id,
                amount,
                order_tracking_number,
                failure_message,
                ..
            } => {
                assert_eq!(intent_id, "pi_1");
                assert_eq!(amount, 4298);
                assert_eq!(order_tracking_number.as_deref(), Some("trk-1"));
                assert_eq!(failure_message.as_deref(), Some("Your card was declined."));
            }
            other => panic!("expected payment intent data, got {:?}", other),
        }
        assert_eq!(event.raw["id"], "evt_1");
    }

    #[test]
    fn unknown_event_keeps_raw_object() {
        let adapter = StripePaymentAdapter::new(test_config());
        let payload = r#"{"id":"evt_2","type":"charge.refunded","created":1,"data":{"object":{"id":"ch_1"}}}"#;
        let event = adapter.parse_event(payload.as_bytes()).unwrap();

        assert_eq!(event.event_type, WebhookEventType::Unknown("charge.refunded".into()));
        assert!(matches!(event.data, WebhookEventData::Raw { .. }));
    }

    #[test]
    fn livemode_requirement_rejects_test_events() {
        let adapter = StripePaymentAdapter::new(test_config().with_require_livemode(true));
        let err = adapter
            .parse_event(intent_event("payment_intent.succeeded").as_bytes())
            .unwrap_err();
        assert!(err.message.contains("Test mode"));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Error Translation Tests
    // ════════════════════════════════════════════════════════════════════════════

    fn error_body(error_type: &str, code: Option<&str>, decline: Option<&str>) -> String {
        serde_json::json!({
            "error": {
                "type": error_type,
                "code": code,
                "decline_code": decline,
                "message": "from stripe"
            }
        })
        .to_string()
    }

    #[test]
    fn translates_card_failures() {
        let cases = [
            (Some("card_declined"), Some("generic_decline"), PaymentErrorCode::CardDeclined),
            (Some("card_declined"), Some("insufficient_funds"), PaymentErrorCode::InsufficientFunds),
            (Some("expired_card"), None, PaymentErrorCode::CardExpired),
            (Some("incorrect_cvc"), None, PaymentErrorCode::InvalidCard),
        ];
        for (code, decline, expected) in cases {
            let body = error_body("card_error", code, decline);
            let err = translate_error(StatusCode::PAYMENT_REQUIRED, &body);
            assert_eq!(err.code, expected, "code={:?} decline={:?}", code, decline);
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn decline_code_becomes_provider_code() {
        let body = error_body("card_error", Some("card_declined"), Some("lost_card"));
        let err = translate_error(StatusCode::PAYMENT_REQUIRED, &body);
        assert_eq!(err.provider_code.as_deref(), Some("lost_card"));
        assert_eq!(err.message, "from stripe");
    }

    #[test]
    fn translates_http_statuses() {
        let cases = [
            (StatusCode::UNAUTHORIZED, PaymentErrorCode::AuthenticationError),
            (StatusCode::NOT_FOUND, PaymentErrorCode::NotFound),
            (StatusCode::TOO_MANY_REQUESTS, PaymentErrorCode::RateLimitExceeded),
            (StatusCode::BAD_GATEWAY, PaymentErrorCode::ProviderUnavailable),
            (StatusCode::BAD_REQUEST, PaymentErrorCode::InvalidRequest),
        ];
        for (status, expected) in cases {
            assert_eq!(translate_error(status, "not json").code, expected);
        }
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = translate_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert!(err.is_retryable());
        assert!(err.message.contains("503"));
    }

    #[test]
    fn idempotency_conflict_is_distinct() {
        let body = error_body("idempotency_error", None, None);
        let err = translate_error(StatusCode::BAD_REQUEST, &body);
        assert_eq!(err.code, PaymentErrorCode::IdempotencyConflict);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // HTTP Tests (against a local fake of the Stripe API)
    // ════════════════════════════════════════════════════════════════════════════

    #[derive(Clone, Default)]
    struct Seen {
        form: Arc<Mutex<HashMap<String, String>>>,
        idempotency_key: Arc<Mutex<Option<String>>>,
    }

    async fn create_intent(
        State(seen): State<Seen>,
        headers: HeaderMap,
        Form(form): Form<HashMap<String, String>>,
    ) -> Json<serde_json::Value> {
        *seen.idempotency_key.lock().unwrap() = headers
            .get("idempotency-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let amount: i64 = form["amount"].parse().unwrap();
        *seen.form.lock().unwrap() = form;
        Json(serde_json::json!({
            "id": "pi_fake",
            "client_secret": "pi_fake_secret_abc",
            "amount": amount,
            "currency": "usd",
            "status": "requires_payment_method",
            "created": 1704067200
        }))
    }

    async fn cancel_intent(Path(id): Path<String>) -> (axum::http::StatusCode, String) {
        let body = serde_json::json!({
            "error": {
                "type": "invalid_request_error",
                "code": "resource_missing",
                "message": format!("No such payment_intent: '{}'", id)
            }
        });
        (axum::http::StatusCode::NOT_FOUND, body.to_string())
    }

    async fn fake_stripe(seen: Seen) -> String {
        let app = Router::new()
            .route("/v1/payment_intents", post(create_intent))
            .route("/v1/payment_intents/:id/cancel", post(cancel_intent))
            .with_state(seen);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn create_posts_form_with_idempotency_key() {
        let seen = Seen::default();
        let base = fake_stripe(seen.clone()).await;
        let adapter = StripePaymentAdapter::new(test_config().with_base_url(base));

        let info = PaymentInfo::new(Money::from_cents(4298).unwrap(), "USD", Some("ada@example.com"))
            .unwrap();
        let intent = adapter
            .create_payment_intent(CreatePaymentIntentRequest::for_order(info, "trk-9"))
            .await
            .unwrap();

        assert_eq!(intent.id, "pi_fake");
        assert_eq!(intent.client_secret.as_deref(), Some("pi_fake_secret_abc"));
        assert_eq!(intent.amount.cents(), 4298);
        assert_eq!(intent.status, PaymentIntentStatus::RequiresPaymentMethod);

        let form = seen.form.lock().unwrap().clone();
        assert_eq!(form["amount"], "4298");
        assert_eq!(form["currency"], "usd");
        assert_eq!(form["receipt_email"], "ada@example.com");
        assert_eq!(form["metadata[order_tracking_number]"], "trk-9");
        assert_eq!(form["automatic_payment_methods[enabled]"], "true");
        assert_eq!(
            seen.idempotency_key.lock().unwrap().as_deref(),
            Some("order-trk-9")
        );
    }

    #[tokio::test]
    async fn cancel_of_unknown_intent_is_not_found() {
        let base = fake_stripe(Seen::default()).await;
        let adapter = StripePaymentAdapter::new(test_config().with_base_url(base));

        let err = adapter.cancel_payment_intent("pi_missing").await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NotFound);
        assert_eq!(err.provider_code.as_deref(), Some("resource_missing"));
    }

    #[tokio::test]
    async fn unreachable_api_is_network_error() {
        let adapter =
            StripePaymentAdapter::new(test_config().with_base_url("http://127.0.0.1:1"));
        let err = adapter.retrieve_payment_intent("pi_1").await.unwrap_err();
        assert_eq!(err.code, PaymentErrorCode::NetworkError);
        assert!(err.is_retryable());
    }
}
