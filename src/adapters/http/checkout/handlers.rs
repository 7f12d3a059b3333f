//! HTTP handlers for checkout endpoints.
//!
//! These handlers connect Axum routes to the checkout service and the
//! application layer command/query handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;

use crate::application::handlers::{
    GetOrderHandler, GetOrderQuery, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    HandlePaymentWebhookResult, OrderHistoryHandler, OrderHistoryQuery,
};
use crate::application::CheckoutService;
use crate::domain::checkout::{PaymentInfo, Purchase};
use crate::domain::foundation::ValidationError;
use crate::ports::{
    EventPublisher, OrderRepository, PaymentGateway, StockReservations, WebhookEventRepository,
};

use super::super::error::ApiError;
use super::dto::{
    HealthResponse, OrderHistoryEntry, OrderHistoryParams, OrderHistoryResponse, OrderResponse,
    PaymentIntentRequest, PaymentIntentResponse, PurchaseBody, PurchaseResponseDto, WebhookAck,
};

/// Header carrying the processor's webhook signature.
pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned for each request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct CheckoutAppState {
    pub checkout: Arc<dyn CheckoutService>,
    pub orders: Arc<dyn OrderRepository>,
    pub stock: Arc<dyn StockReservations>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub processed_webhooks: Arc<dyn WebhookEventRepository>,
    pub event_publisher: Arc<dyn EventPublisher>,
}

impl CheckoutAppState {
    pub fn get_order_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.orders.clone())
    }

    pub fn order_history_handler(&self) -> OrderHistoryHandler {
        OrderHistoryHandler::new(self.orders.clone())
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.orders.clone(),
            self.stock.clone(),
            self.gateway.clone(),
            self.processed_webhooks.clone(),
            self.event_publisher.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/checkout/purchase - Place an order
pub async fn place_order(
    State(state): State<CheckoutAppState>,
    Json(body): Json<PurchaseBody>,
) -> Result<impl IntoResponse, ApiError> {
    let purchase = Purchase::try_from(body.into_purchase())?;

    let result = state.checkout.place_order(purchase).await?;

    Ok(Json(PurchaseResponseDto::from(result)))
}

/// POST /api/checkout/payment-intent - Open a standalone payment intent
pub async fn create_payment_intent(
    State(state): State<CheckoutAppState>,
    Json(request): Json<PaymentIntentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let info = PaymentInfo::try_from(request)?;

    let intent = state.checkout.create_payment_intent(info).await?;

    Ok(Json(PaymentIntentResponse::from(intent)))
}

/// POST /api/webhooks/stripe - Handle payment processor events
pub async fn handle_stripe_webhook(
    State(state): State<CheckoutAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ValidationError::empty_field(SIGNATURE_HEADER))?;

    let handler = state.webhook_handler();
    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature: signature.to_string(),
    };

    let result = handler.handle(cmd).await?;

    let outcome = match result {
        HandlePaymentWebhookResult::OrderPaid { .. } => "order_paid",
        HandlePaymentWebhookResult::PaymentFailed { .. } => "payment_failed",
        HandlePaymentWebhookResult::OrderCancelled { .. } => "order_cancelled",
        HandlePaymentWebhookResult::AlreadyProcessed => "already_processed",
        HandlePaymentWebhookResult::Ignored { .. } => "ignored",
    };

    Ok(Json(WebhookAck {
        received: true,
        outcome: outcome.to_string(),
    }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/orders/:tracking_number - Look up one order
pub async fn get_order(
    State(state): State<CheckoutAppState>,
    Path(tracking_number): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.get_order_handler();

    let order = handler.handle(GetOrderQuery { tracking_number }).await?;

    Ok(Json(OrderResponse::from(&order)))
}

/// GET /api/orders?email= - Orders placed under an e-mail address
pub async fn order_history(
    State(state): State<CheckoutAppState>,
    Query(params): Query<OrderHistoryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let handler = state.order_history_handler();

    let orders = handler
        .handle(OrderHistoryQuery {
            email: params.email,
        })
        .await?;

    Ok(Json(OrderHistoryResponse {
        orders: orders.iter().map(OrderHistoryEntry::from).collect(),
    }))
}

/// GET /health - Liveness check
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::events::InMemoryEventBus;
    use crate::adapters::http::error::ErrorResponse;
    use crate::adapters::memory::{
        InMemoryCatalog, InMemoryOrderRepository, InMemoryWebhookEventRepository,
    };
    use crate::adapters::stripe::MockPaymentGateway;
    use crate::application::handlers::{CreatePaymentIntentHandler, PlaceOrderHandler};
    use crate::application::{CheckoutServiceImpl, RetryPolicy};
    use crate::domain::foundation::{Money, ProductId};
    use crate::ports::CatalogProduct;
    use axum::http::StatusCode;
    use axum::response::Response;

    struct Harness {
        state: CheckoutAppState,
        catalog: Arc<InMemoryCatalog>,
        events: Arc<InMemoryEventBus>,
    }

    fn harness() -> Harness {
        let orders = Arc::new(InMemoryOrderRepository::new());
        let catalog = Arc::new(InMemoryCatalog::with_products([CatalogProduct {
            id: ProductId::new(1).unwrap(),
            name: "Coffee Mug".to_string(),
            unit_price: Money::from_cents(1899).unwrap(),
            active: true,
            units_in_stock: 10,
        }]));
        let gateway = Arc::new(MockPaymentGateway::new());
        let events = Arc::new(InMemoryEventBus::new());

        let place_order = PlaceOrderHandler::new(
            orders.clone(),
            catalog.clone(),
            catalog.clone(),
            gateway.clone(),
            events.clone(),
        );
        let create_intent =
            CreatePaymentIntentHandler::new(gateway.clone()).with_retry(RetryPolicy::none());
        let checkout = Arc::new(CheckoutServiceImpl::new(
            Arc::new(place_order),
            Arc::new(create_intent),
        ));

        Harness {
            state: CheckoutAppState {
                checkout,
                orders,
                stock: catalog.clone(),
                gateway,
                processed_webhooks: Arc::new(InMemoryWebhookEventRepository::new()),
                event_publisher: events.clone(),
            },
            catalog,
            events,
        }
    }

    fn purchase_body(quantity: u32) -> PurchaseBody {
        serde_json::from_value(serde_json::json!({
            "customer": {"firstName": "Grace", "lastName": "Hopper", "email": "grace@example.com"},
            "shippingAddress": {"street": "12 Navy Way", "city": "Arlington", "state": "VA",
                                "country": "US", "zipCode": "22202"},
            "billingAddress": {"street": "12 Navy Way", "city": "Arlington", "state": "VA",
                               "country": "US", "zipCode": "22202"},
            "order": {"totalPrice": 18.99 * f64::from(quantity), "totalQuantity": quantity},
            "orderItems": [
                {"productId": 1, "imageUrl": "assets/mug.png", "unitPrice": 18.99, "quantity": quantity}
            ]
        }))
        .unwrap()
    }

    async fn json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn place_order_returns_confirmation() {
        let h = harness();
        let response = place_order(State(h.state.clone()), Json(purchase_body(2)))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body: PurchaseResponseDto = json(response).await;
        assert!(body.payment_intent_id.starts_with("pi_mock_"));
        assert_eq!(h.catalog.stock_of(ProductId::new(1).unwrap()).await, Some(8));
        assert!(h.events.has_event("order.placed.v1"));
    }

    #[tokio::test]
    async fn place_order_rejects_invalid_customer() {
        let h = harness();
        let body = serde_json::json!({
            "customer": {"firstName": "", "lastName": "Hopper", "email": "grace@example.com"},
            "shippingAddress": {"street": "12 Navy Way", "city": "Arlington", "state": "VA",
                                "country": "US", "zipCode": "22202"},
            "billingAddress": {"street": "12 Navy Way", "city": "Arlington", "state": "VA",
                               "country": "US", "zipCode": "22202"},
            "order": {"totalPrice": 18.99, "totalQuantity": 1},
            "orderItems": [{"productId": 1, "unitPrice": 18.99, "quantity": 1}]
        });
        let body: PurchaseBody = serde_json::from_value(body).unwrap();

        let response = place_order(State(h.state), Json(body)).await.into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = json(response).await;
        assert_eq!(error.code, "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn create_payment_intent_returns_client_secret() {
        let h = harness();
        let request = PaymentIntentRequest {
            amount: 4200,
            currency: "USD".to_string(),
            receipt_email: Some("grace@example.com".to_string()),
        };

        let response = create_payment_intent(State(h.state), Json(request))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body: PaymentIntentResponse = json(response).await;
        assert_eq!(body.amount, 4200);
        assert_eq!(body.currency, "usd");
        assert!(body.client_secret.is_some());
    }

    #[tokio::test]
    async fn get_order_round_trips_placed_order() {
        let h = harness();
        let placed: PurchaseResponseDto = json(
            place_order(State(h.state.clone()), Json(purchase_body(1)))
                .await
                .into_response(),
        )
        .await;

        let response = get_order(
            State(h.state),
            Path(placed.order_tracking_number.clone()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let order: OrderResponse = json(response).await;
        assert_eq!(order.order_tracking_number, placed.order_tracking_number);
        assert_eq!(order.status, "awaiting_payment");
        assert_eq!(order.order_items.len(), 1);
    }

    #[tokio::test]
    async fn get_order_unknown_is_not_found() {
        let h = harness();
        let response = get_order(
            State(h.state),
            Path("7c9e6679-7425-40de-944b-e07fc1f90ae7".to_string()),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn order_history_lists_orders_for_email() {
        let h = harness();
        for _ in 0..2 {
            let response = place_order(State(h.state.clone()), Json(purchase_body(1)))
                .await
                .into_response();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = order_history(
            State(h.state),
            Query(OrderHistoryParams {
                email: "GRACE@example.com".to_string(),
            }),
        )
        .await
        .into_response();

        let body: OrderHistoryResponse = json(response).await;
        assert_eq!(body.orders.len(), 2);
    }

    #[tokio::test]
    async fn webhook_without_signature_is_rejected() {
        let h = harness();
        let response = handle_stripe_webhook(
            State(h.state),
            HeaderMap::new(),
            Bytes::from_static(b"{}"),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn webhook_marks_order_paid() {
        let h = harness();
        let placed: PurchaseResponseDto = json(
            place_order(State(h.state.clone()), Json(purchase_body(1)))
                .await
                .into_response(),
        )
        .await;

        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, "t=1,v1=abc".parse().unwrap());
        let payload = serde_json::json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": placed.payment_intent_id}}
        });

        let response = handle_stripe_webhook(
            State(h.state.clone()),
            headers,
            Bytes::from(payload.to_string()),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let ack: WebhookAck = json(response).await;
        assert_eq!(ack.outcome, "order_paid");

        let order = h
            .state
            .get_order_handler()
            .handle(GetOrderQuery {
                tracking_number: placed.order_tracking_number,
            })
            .await
            .unwrap();
        assert_eq!(order.status.as_str(), "paid");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let response = health().await.into_response();
        let body: HealthResponse = json(response).await;
        assert_eq!(body.status, "ok");
    }
}
