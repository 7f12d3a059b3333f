//! HandlePaymentWebhookHandler - Applies processor events to orders.
//!
//! Every verified event is looked up in the processed-event ledger first, so
//! a redelivered event is acknowledged without touching the order again.
//! Events that cannot be applied (unknown type, no matching order, stale
//! status) are recorded as ignored. Failures are not recorded, which lets
//! the processor redeliver them.
//!
//! Status writes are conditional on the status the handler read, so two
//! deliveries racing past the ledger check cannot both apply.

use std::sync::Arc;

use crate::domain::checkout::{
    CheckoutError, Order, OrderCancelled, OrderPaid, OrderPaymentFailed,
};
use crate::domain::foundation::{
    EventEnvelope, EventId, OrderTrackingNumber, SerializableDomainEvent, Timestamp,
};
use crate::ports::{
    EventPublisher, OrderRepository, PaymentGateway, SaveResult, StockLine, StockReservations,
    UpdateResult, WebhookEvent, WebhookEventData, WebhookEventRecord, WebhookEventRepository,
    WebhookEventType,
};

/// Reason stored on an order when the processor gives none.
const DEFAULT_FAILURE_REASON: &str = "Payment failed";

/// Guarded writes tried before the event is left for redelivery.
const MAX_TRANSITION_ATTEMPTS: u32 = 3;

/// Outcome of a guarded status change.
enum Transition<T> {
    Applied(Order, T),
    /// The order's current status does not allow the change.
    Rejected(CheckoutError),
    /// The order disappeared between reads.
    Vanished,
}

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload.
    pub payload: Vec<u8>,
    /// Webhook signature header.
    pub signature: String,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentWebhookResult {
    /// Payment captured, order marked paid.
    OrderPaid { tracking_number: String },
    /// Payment attempt failed; the order can still be paid.
    PaymentFailed {
        tracking_number: String,
        reason: String,
    },
    /// Intent cancelled, order cancelled and stock returned.
    OrderCancelled { tracking_number: String },
    /// Event was handled on an earlier delivery.
    AlreadyProcessed,
    /// Event acknowledged but no action taken.
    Ignored { reason: String },
}

impl HandlePaymentWebhookResult {
    fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored {
            reason: reason.into(),
        }
    }
}

pub struct HandlePaymentWebhookHandler {
    orders: Arc<dyn OrderRepository>,
    stock: Arc<dyn StockReservations>,
    gateway: Arc<dyn PaymentGateway>,
    processed: Arc<dyn WebhookEventRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        stock: Arc<dyn StockReservations>,
        gateway: Arc<dyn PaymentGateway>,
        processed: Arc<dyn WebhookEventRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            orders,
            stock,
            gateway,
            processed,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, CheckoutError> {
        // 1. Verify signature and parse
        let event = self
            .gateway
            .verify_webhook(&cmd.payload, &cmd.signature)
            .await?;

        // 2. Deduplicate
        if self.processed.find_by_event_id(&event.id).await?.is_some() {
            tracing::debug!(event_id = %event.id, "Webhook event already processed");
            return Ok(HandlePaymentWebhookResult::AlreadyProcessed);
        }

        // 3. Apply
        let result = match &event.event_type {
            WebhookEventType::PaymentIntentSucceeded => self.apply_succeeded(&event).await?,
            WebhookEventType::PaymentIntentPaymentFailed => self.apply_failed(&event).await?,
            WebhookEventType::PaymentIntentCanceled => self.apply_canceled(&event).await?,
            WebhookEventType::Unknown(kind) => {
                HandlePaymentWebhookResult::ignored(format!("unhandled event type {}", kind))
            }
        };

        // 4. Record
        self.record(&event, &result).await?;

        tracing::info!(
            event_id = %event.id,
            event_type = event.event_type.as_str(),
            result = ?result,
            "Webhook processed"
        );
        Ok(result)
    }

    async fn apply_succeeded(
        &self,
        event: &WebhookEvent,
    ) -> Result<HandlePaymentWebhookResult, CheckoutError> {
        let Some((order, intent_id, _)) = self.target_order(event).await? else {
            return Ok(no_order(event));
        };
        let order = match self.transition(order, Order::mark_paid).await? {
            Transition::Applied(order, ()) => order,
            Transition::Rejected(e) => return Ok(stale(e)),
            Transition::Vanished => return Ok(no_order(event)),
        };

        self.publish(
            event,
            OrderPaid {
                event_id: EventId::new(),
                order_id: order.id,
                tracking_number: order.tracking_number.to_string(),
                payment_intent_id: intent_id,
                amount: order.total_price,
                paid_at: Timestamp::now(),
            }
            .to_envelope(),
        )
        .await;

        Ok(HandlePaymentWebhookResult::OrderPaid {
            tracking_number: order.tracking_number.to_string(),
        })
    }

    async fn apply_failed(
        &self,
        event: &WebhookEvent,
    ) -> Result<HandlePaymentWebhookResult, CheckoutError> {
        let Some((order, intent_id, failure)) = self.target_order(event).await? else {
            return Ok(no_order(event));
        };
        let reason = failure.unwrap_or_else(|| DEFAULT_FAILURE_REASON.to_string());
        let order = match self
            .transition(order, |o| o.mark_payment_failed(reason.as_str()))
            .await?
        {
            Transition::Applied(order, ()) => order,
            Transition::Rejected(e) => return Ok(stale(e)),
            Transition::Vanished => return Ok(no_order(event)),
        };

        self.publish(
            event,
            OrderPaymentFailed {
                event_id: EventId::new(),
                order_id: order.id,
                tracking_number: order.tracking_number.to_string(),
                payment_intent_id: intent_id,
                reason: reason.clone(),
                failed_at: Timestamp::now(),
            }
            .to_envelope(),
        )
        .await;

        Ok(HandlePaymentWebhookResult::PaymentFailed {
            tracking_number: order.tracking_number.to_string(),
            reason,
        })
    }

    async fn apply_canceled(
        &self,
        event: &WebhookEvent,
    ) -> Result<HandlePaymentWebhookResult, CheckoutError> {
        let Some((order, _, _)) = self.target_order(event).await? else {
            return Ok(no_order(event));
        };
        let cancel = |o: &mut Order| {
            let held_stock = o.status.holds_reservation();
            o.cancel().map(|()| held_stock)
        };
        let (order, held_stock) = match self.transition(order, cancel).await? {
            Transition::Applied(order, held_stock) => (order, held_stock),
            Transition::Rejected(e) => return Ok(stale(e)),
            Transition::Vanished => return Ok(no_order(event)),
        };

        if held_stock {
            if let Err(e) = self.stock.release(&StockLine::from_order(&order)).await {
                tracing::error!(
                    tracking_number = %order.tracking_number,
                    error = %e,
                    "Failed to release stock for cancelled order"
                );
            }
        }

        self.publish(
            event,
            OrderCancelled {
                event_id: EventId::new(),
                order_id: order.id,
                tracking_number: order.tracking_number.to_string(),
                reason: "payment intent canceled".to_string(),
                cancelled_at: Timestamp::now(),
            }
            .to_envelope(),
        )
        .await;

        Ok(HandlePaymentWebhookResult::OrderCancelled {
            tracking_number: order.tracking_number.to_string(),
        })
    }

    /// Applies `change` and writes the order only if its stored status is
    /// still the one `change` saw. When another delivery got there first the
    /// order is reloaded and `change` runs again against the new status.
    async fn transition<T, F>(
        &self,
        mut order: Order,
        mut change: F,
    ) -> Result<Transition<T>, CheckoutError>
    where
        F: FnMut(&mut Order) -> Result<T, CheckoutError> + Send,
        T: Send,
    {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let expected = order.status;
            let outcome = match change(&mut order) {
                Ok(outcome) => outcome,
                Err(e) => return Ok(Transition::Rejected(e)),
            };

            match self.orders.update(&order, expected).await? {
                UpdateResult::Updated => return Ok(Transition::Applied(order, outcome)),
                UpdateResult::StatusChanged => {
                    tracing::debug!(
                        tracking_number = %order.tracking_number,
                        "Order changed concurrently, reloading"
                    );
                    order = match self
                        .orders
                        .find_by_tracking_number(&order.tracking_number)
                        .await?
                    {
                        Some(current) => current,
                        None => return Ok(Transition::Vanished),
                    };
                }
            }
        }

        Err(CheckoutError::infrastructure(format!(
            "order {} kept changing during webhook processing",
            order.tracking_number
        )))
    }

    /// Finds the order an intent event refers to: by intent id, then by the
    /// tracking number in the intent's metadata.
    async fn target_order(
        &self,
        event: &WebhookEvent,
    ) -> Result<Option<(Order, String, Option<String>)>, CheckoutError> {
        let WebhookEventData::PaymentIntent {
            intent_id,
            order_tracking_number,
            failure_message,
            ..
        } = &event.data
        else {
            return Ok(None);
        };

        let mut order = self.orders.find_by_payment_intent_id(intent_id).await?;
        if order.is_none() {
            if let Some(tracking) = order_tracking_number
                .as_deref()
                .and_then(|t| OrderTrackingNumber::parse(t).ok())
            {
                order = self.orders.find_by_tracking_number(&tracking).await?;
            }
        }

        Ok(order.map(|o| (o, intent_id.clone(), failure_message.clone())))
    }

    async fn record(
        &self,
        event: &WebhookEvent,
        result: &HandlePaymentWebhookResult,
    ) -> Result<(), CheckoutError> {
        let record = match result {
            HandlePaymentWebhookResult::Ignored { reason } => WebhookEventRecord::ignored(
                event.id.as_str(),
                event.event_type.as_str(),
                reason.as_str(),
                event.raw.clone(),
            ),
            _ => WebhookEventRecord::applied(
                event.id.as_str(),
                event.event_type.as_str(),
                event.raw.clone(),
            ),
        };

        if self.processed.save(record).await? == SaveResult::AlreadyExists {
            tracing::warn!(event_id = %event.id, "Webhook event recorded concurrently");
        }
        Ok(())
    }

    /// Publishes an event caused by `cause`; failures are only logged.
    async fn publish(
        &self,
        cause: &WebhookEvent,
        envelope: Result<EventEnvelope, serde_json::Error>,
    ) {
        let result = match envelope {
            Ok(envelope) => self
                .event_publisher
                .publish(envelope.with_causation_id(cause.id.as_str()))
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(error) = result {
            tracing::warn!(error = %error, "Failed to publish order event");
        }
    }
}

fn no_order(event: &WebhookEvent) -> HandlePaymentWebhookResult {
    tracing::warn!(event_id = %event.id, "No order matches webhook event");
    HandlePaymentWebhookResult::ignored("no matching order")
}

fn stale(error: CheckoutError) -> HandlePaymentWebhookResult {
    tracing::info!(error = %error, "Ignoring stale webhook event");
    match error {
        CheckoutError::InvalidTransition { from, to } => HandlePaymentWebhookResult::ignored(
            format!("order is {}, cannot become {}", from, to),
        ),
        other => HandlePaymentWebhookResult::ignored(other.message()),
    }
}
