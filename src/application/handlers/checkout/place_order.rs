//! PlaceOrderHandler - Checkout orchestrator.
//!
//! Turns a shopper's purchase into a committed order with a payment intent:
//!
//! 1. Build the aggregate and check the summary against the items
//! 2. Reprice every line from the catalog
//! 3. Reserve stock
//! 4. Create the payment intent (idempotent on the tracking number)
//! 5. Persist the order
//! 6. Publish `OrderPlaced`
//!
//! Any failure after step 3 releases the reservation, and an intent created
//! in step 4 is cancelled when the order cannot be saved. Steps 3 to 6 run
//! on a spawned task, so they finish even if the caller stops waiting.

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::retry::{retry_transient, RetryPolicy};
use crate::domain::checkout::{
    CheckoutError, Order, OrderAggregateBuilder, OrderPlaced, PaymentInfo, PaymentIntent,
    Purchase, PurchaseResponse, DEFAULT_MAX_ITEMS,
};
use crate::domain::foundation::{Money, ProductId, SerializableDomainEvent};
use crate::ports::{
    CreatePaymentIntentRequest, EventPublisher, OrderRepository, PaymentGateway, ProductCatalog,
    StockLine, StockReservations,
};

/// Command to place an order.
#[derive(Debug, Clone)]
pub struct PlaceOrderCommand {
    pub purchase: Purchase,
}

/// Result of placing an order.
pub type PlaceOrderResult = PurchaseResponse;

/// Knobs for the checkout flow.
#[derive(Debug, Clone)]
pub struct PlaceOrderSettings {
    /// Currency every order is charged in.
    pub currency: String,

    /// Ceiling on distinct lines per order.
    pub max_items: usize,

    /// Refuse the order when a catalog price differs from the cart price.
    /// When false the order is silently repriced.
    pub reject_price_changes: bool,

    /// Backoff for intent creation.
    pub retry: RetryPolicy,
}

impl Default for PlaceOrderSettings {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            max_items: DEFAULT_MAX_ITEMS,
            reject_price_changes: true,
            retry: RetryPolicy::default(),
        }
    }
}

/// Handler for placing orders.
#[derive(Clone)]
pub struct PlaceOrderHandler {
    orders: Arc<dyn OrderRepository>,
    catalog: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockReservations>,
    gateway: Arc<dyn PaymentGateway>,
    event_publisher: Arc<dyn EventPublisher>,
    settings: PlaceOrderSettings,
}

impl PlaceOrderHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockReservations>,
        gateway: Arc<dyn PaymentGateway>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            orders,
            catalog,
            stock,
            gateway,
            event_publisher,
            settings: PlaceOrderSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PlaceOrderSettings) -> Self {
        self.settings = settings;
        self
    }

    pub async fn handle(&self, cmd: PlaceOrderCommand) -> Result<PlaceOrderResult, CheckoutError> {
        // 1. Assemble the aggregate
        let mut order = OrderAggregateBuilder::new(cmd.purchase)
            .currency(self.settings.currency.as_str())
            .max_items(self.settings.max_items)
            .build()?;

        // 2. Catalog prices win over cart prices
        self.reprice(&mut order).await?;

        // 3-6 run on their own task: once stock is held, a dropped request
        // (client gone, request timeout) must not skip compensation.
        let checkout = self.clone();
        tokio::spawn(async move { checkout.reserve_and_commit(order).await })
            .await
            .map_err(|e| CheckoutError::infrastructure(format!("Checkout task failed: {}", e)))?
    }

    async fn reserve_and_commit(self, mut order: Order) -> Result<PlaceOrderResult, CheckoutError> {
        // 3. Hold the stock
        let lines = StockLine::from_order(&order);
        self.stock.reserve(&lines).await?;

        // 4. Create the intent
        let intent = match self.create_intent(&order).await {
            Ok(intent) => intent,
            Err(err) => {
                self.release(&order, &lines).await;
                return Err(err);
            }
        };
        order.attach_payment_intent(intent.id.as_str());

        // 5. Persist, undoing the reservation and the intent on failure
        if let Err(err) = self.orders.save(&order).await {
            self.release(&order, &lines).await;
            self.cancel_orphaned_intent(&order, &intent).await;
            return Err(err.into());
        }

        tracing::info!(
            tracking_number = %order.tracking_number,
            payment_intent_id = %intent.id,
            total_cents = order.total_price.cents(),
            items = order.items.len(),
            "Order placed"
        );

        // 6. The order is committed; a publishing failure only gets logged
        self.publish_placed(&order).await;

        Ok(PurchaseResponse {
            order_tracking_number: order.tracking_number.clone(),
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    async fn reprice(&self, order: &mut Order) -> Result<(), CheckoutError> {
        let ids: Vec<ProductId> = order.items.iter().map(|item| item.product_id()).collect();
        let products = self.catalog.find_by_ids(&ids).await?;

        let mut prices: HashMap<ProductId, Money> = HashMap::with_capacity(products.len());
        for product in products {
            if !product.active {
                return Err(CheckoutError::ProductUnavailable(product.id));
            }
            prices.insert(product.id, product.unit_price);
        }

        let changes = order.reprice(&prices)?;
        if let Some(change) = changes.first() {
            if self.settings.reject_price_changes {
                return Err(CheckoutError::PriceChanged {
                    product_id: change.product_id,
                    cart_price: change.cart_price,
                    current_price: change.current_price,
                });
            }
            for change in &changes {
                tracing::warn!(
                    product_id = %change.product_id,
                    cart_cents = change.cart_price.cents(),
                    current_cents = change.current_price.cents(),
                    "Repriced order line from catalog"
                );
            }
        }
        Ok(())
    }

    async fn create_intent(&self, order: &Order) -> Result<PaymentIntent, CheckoutError> {
        let info = PaymentInfo::new(
            order.total_price,
            &order.currency,
            Some(order.customer.email()),
        )?;
        let request = CreatePaymentIntentRequest::for_order(info, order.tracking_number.as_str());

        let intent = retry_transient(self.settings.retry, |_| {
            self.gateway.create_payment_intent(request.clone())
        })
        .await?;
        Ok(intent)
    }

    async fn release(&self, order: &Order, lines: &[StockLine]) {
        if let Err(e) = self.stock.release(lines).await {
            tracing::error!(
                tracking_number = %order.tracking_number,
                error = %e,
                "Failed to release reserved stock"
            );
        }
    }

    /// Cancels the intent of an order that could not be saved, unless the
    /// processor already settled it.
    async fn cancel_orphaned_intent(&self, order: &Order, created: &PaymentIntent) {
        let status = match self.gateway.retrieve_payment_intent(&created.id).await {
            Ok(current) => current.status,
            Err(e) => {
                tracing::warn!(
                    payment_intent_id = %created.id,
                    error = %e,
                    "Could not refresh intent status, using status from creation"
                );
                created.status
            }
        };

        if !status.is_cancellable() {
            tracing::error!(
                tracking_number = %order.tracking_number,
                payment_intent_id = %created.id,
                status = ?status,
                "Intent of unsaved order is already settled"
            );
            return;
        }

        if let Err(e) = self.gateway.cancel_payment_intent(&created.id).await {
            tracing::warn!(
                tracking_number = %order.tracking_number,
                payment_intent_id = %created.id,
                error = %e,
                "Failed to cancel orphaned payment intent"
            );
        }
    }

    async fn publish_placed(&self, order: &Order) {
        let envelope = match OrderPlaced::from_order(order).to_envelope() {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize OrderPlaced");
                return;
            }
        };
        if let Err(e) = self.event_publisher.publish(envelope).await {
            tracing::warn!(
                tracking_number = %order.tracking_number,
                error = %e,
                "Failed to publish OrderPlaced"
            );
        }
    }
}
