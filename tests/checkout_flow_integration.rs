//! Integration tests for the checkout flow through the public service API.
//!
//! These tests exercise the application layer end to end with in-memory
//! adapters:
//! 1. The `CheckoutService` contract works through a trait object
//! 2. Placed orders persist their customer, addresses and items intact
//! 3. Webhook reconciliation is idempotent and releases stock on cancel

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use shop_checkout::adapters::events::InMemoryEventBus;
use shop_checkout::adapters::memory::{
    InMemoryCatalog, InMemoryOrderRepository, InMemoryWebhookEventRepository,
};
use shop_checkout::adapters::stripe::MockPaymentGateway;
use shop_checkout::application::{
    CheckoutService, CheckoutServiceImpl, CreatePaymentIntentHandler,
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
    PlaceOrderHandler, RetryPolicy,
};
use shop_checkout::domain::checkout::{
    Address, CheckoutError, Customer, OrderItem, OrderStatus, OrderSummary, PaymentErrorCode,
    PaymentInfo, Purchase,
};
use shop_checkout::domain::foundation::{Money, ProductId};
use shop_checkout::ports::{CatalogProduct, OrderRepository};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Shop {
    service: Arc<dyn CheckoutService>,
    orders: Arc<InMemoryOrderRepository>,
    catalog: Arc<InMemoryCatalog>,
    gateway: Arc<MockPaymentGateway>,
    webhooks: HandlePaymentWebhookHandler,
}

fn shop() -> Shop {
    let orders = Arc::new(InMemoryOrderRepository::new());
    let catalog = Arc::new(InMemoryCatalog::with_products([
        CatalogProduct {
            id: ProductId::new(10).unwrap(),
            name: "Rust in Action".to_string(),
            unit_price: Money::from_cents(3999).unwrap(),
            active: true,
            units_in_stock: 5,
        },
        CatalogProduct {
            id: ProductId::new(11).unwrap(),
            name: "Sticker Pack".to_string(),
            unit_price: Money::from_cents(499).unwrap(),
            active: true,
            units_in_stock: 50,
        },
    ]));
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
    let webhooks = HandlePaymentWebhookHandler::new(
        orders.clone(),
        catalog.clone(),
        gateway.clone(),
        Arc::new(InMemoryWebhookEventRepository::new()),
        events,
    );

    Shop {
        service: Arc::new(CheckoutServiceImpl::new(
            Arc::new(place_order),
            Arc::new(create_intent),
        )),
        orders,
        catalog,
        gateway,
        webhooks,
    }
}

fn shipping() -> Address {
    Address::new("221B Baker Street", "London", "LDN", "UK", "NW1 6XE").unwrap()
}

fn billing() -> Address {
    Address::new("10 Downing Street", "London", "LDN", "UK", "SW1A 2AA").unwrap()
}

fn item(product: i64, cents: i64, quantity: u32) -> OrderItem {
    OrderItem::new(
        ProductId::new(product).unwrap(),
        format!("assets/{}.png", product),
        Money::from_cents(cents).unwrap(),
        quantity,
    )
    .unwrap()
}

fn purchase(items: Vec<OrderItem>) -> Purchase {
    let total_quantity = items.iter().map(OrderItem::quantity).sum();
    let total_cents = items
        .iter()
        .map(|i| i.unit_price().cents() * i64::from(i.quantity()))
        .sum();
    Purchase {
        customer: Customer::new("Sherlock", "Holmes", "Sherlock@Example.com").unwrap(),
        shipping_address: shipping(),
        billing_address: billing(),
        order: OrderSummary {
            total_price: Money::from_cents(total_cents).unwrap(),
            total_quantity,
        },
        order_items: items.into_iter().collect(),
    }
}

fn event(id: &str, event_type: &str, intent_id: &str) -> HandlePaymentWebhookCommand {
    HandlePaymentWebhookCommand {
        payload: json!({
            "id": id,
            "type": event_type,
            "data": {"object": {"id": intent_id}}
        })
        .to_string()
        .into_bytes(),
        signature: "t=1700000000,v1=0123".to_string(),
    }
}

// =============================================================================
// CheckoutService contract
// =============================================================================

#[tokio::test]
async fn place_order_persists_the_whole_aggregate() {
    let shop = shop();

    let response = shop
        .service
        .place_order(purchase(vec![item(10, 3999, 1), item(11, 499, 4)]))
        .await
        .unwrap();

    let order = shop
        .orders
        .find_by_tracking_number(&response.order_tracking_number)
        .await
        .unwrap()
        .expect("order should be stored");

    assert_eq!(order.status, OrderStatus::AwaitingPayment);
    assert_eq!(order.total_quantity, 5);
    assert_eq!(order.total_price.cents(), 3999 + 4 * 499);
    assert_eq!(order.customer.email(), "sherlock@example.com");
    assert_eq!(order.shipping_address.street(), shipping().street());
    assert_eq!(order.shipping_address.zip_code(), shipping().zip_code());
    assert_eq!(order.billing_address.city(), billing().city());
    assert_eq!(order.items.len(), 2);
    assert_eq!(
        order.payment_intent_id.as_deref(),
        Some(response.payment_intent_id.as_str())
    );
}

#[tokio::test]
async fn identical_items_collapse_in_purchase_set() {
    let items: HashSet<OrderItem> = [item(11, 499, 2), item(11, 499, 2)].into_iter().collect();
    assert_eq!(items.len(), 1);

    let shop = shop();
    let response = shop
        .service
        .place_order(purchase(items.into_iter().collect()))
        .await
        .unwrap();
    let order = shop
        .orders
        .find_by_tracking_number(&response.order_tracking_number)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.total_quantity, 2);
}

#[tokio::test]
async fn create_payment_intent_propagates_gateway_error_kind() {
    let shop = shop();
    shop.gateway.fail_next(
        "create_payment_intent",
        shop_checkout::domain::checkout::PaymentError::new(
            PaymentErrorCode::InvalidRequest,
            "Amount must be at least 50 cents",
        )
        .with_provider_code("amount_too_small"),
    );

    let info = PaymentInfo::new(Money::from_cents(10).unwrap(), "usd", None).unwrap();
    let err = shop.service.create_payment_intent(info).await.unwrap_err();

    match err {
        CheckoutError::Payment(payment) => {
            assert_eq!(payment.code, PaymentErrorCode::InvalidRequest);
            assert_eq!(payment.provider_code.as_deref(), Some("amount_too_small"));
        }
        other => panic!("expected payment error, got {:?}", other),
    }
}

#[tokio::test]
async fn create_payment_intent_returns_processor_intent() {
    let shop = shop();
    let info = PaymentInfo::new(
        Money::from_cents(12_345).unwrap(),
        "GBP",
        Some("sherlock@example.com"),
    )
    .unwrap();

    let intent = shop.service.create_payment_intent(info).await.unwrap();

    assert_eq!(intent.amount.cents(), 12_345);
    assert_eq!(intent.currency, "gbp");
    assert!(shop.gateway.intent(&intent.id).is_some());
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn payment_lifecycle_failed_then_succeeded() {
    let shop = shop();
    let response = shop
        .service
        .place_order(purchase(vec![item(10, 3999, 2)]))
        .await
        .unwrap();
    let intent = response.payment_intent_id.clone();

    let failed = shop
        .webhooks
        .handle(event("evt_a", "payment_intent.payment_failed", &intent))
        .await
        .unwrap();
    assert!(matches!(failed, HandlePaymentWebhookResult::PaymentFailed { .. }));
    assert_eq!(
        shop.catalog.stock_of(ProductId::new(10).unwrap()).await,
        Some(3)
    );

    let paid = shop
        .webhooks
        .handle(event("evt_b", "payment_intent.succeeded", &intent))
        .await
        .unwrap();
    assert!(matches!(paid, HandlePaymentWebhookResult::OrderPaid { .. }));

    let replay = shop
        .webhooks
        .handle(event("evt_b", "payment_intent.succeeded", &intent))
        .await
        .unwrap();
    assert_eq!(replay, HandlePaymentWebhookResult::AlreadyProcessed);

    let order = shop
        .orders
        .find_by_payment_intent_id(&intent)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn cancel_after_payment_is_ignored() {
    let shop = shop();
    let response = shop
        .service
        .place_order(purchase(vec![item(10, 3999, 1)]))
        .await
        .unwrap();
    let intent = response.payment_intent_id;

    shop.webhooks
        .handle(event("evt_1", "payment_intent.succeeded", &intent))
        .await
        .unwrap();
    let late_cancel = shop
        .webhooks
        .handle(event("evt_2", "payment_intent.canceled", &intent))
        .await
        .unwrap();

    assert!(matches!(late_cancel, HandlePaymentWebhookResult::Ignored { .. }));
    assert_eq!(
        shop.catalog.stock_of(ProductId::new(10).unwrap()).await,
        Some(4)
    );
}
