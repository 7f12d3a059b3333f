//! Order lifecycle events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{domain_event, EventId, Money, OrderId, Timestamp};

use super::Order;

/// An order was committed and is awaiting payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub customer_email: String,
    pub total_quantity: u32,
    pub total_price: Money,
    pub currency: String,
    pub payment_intent_id: Option<String>,
    pub placed_at: Timestamp,
}

domain_event!(
    OrderPlaced,
    event_type = "order.placed.v1",
    schema_version = 1,
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = placed_at,
    event_id = event_id
);

impl OrderPlaced {
    pub fn from_order(order: &Order) -> Self {
        Self {
            event_id: EventId::new(),
            order_id: order.id,
            tracking_number: order.tracking_number.to_string(),
            customer_email: order.customer.email().to_string(),
            total_quantity: order.total_quantity,
            total_price: order.total_price,
            currency: order.currency.clone(),
            payment_intent_id: order.payment_intent_id.clone(),
            placed_at: order.created_at,
        }
    }
}

/// The processor captured payment for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaid {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub payment_intent_id: String,
    pub amount: Money,
    pub paid_at: Timestamp,
}

domain_event!(
    OrderPaid,
    event_type = "order.paid.v1",
    schema_version = 1,
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = paid_at,
    event_id = event_id
);

/// A payment attempt for an order failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaymentFailed {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub payment_intent_id: String,
    pub reason: String,
    pub failed_at: Timestamp,
}

domain_event!(
    OrderPaymentFailed,
    event_type = "order.payment_failed.v1",
    schema_version = 1,
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = failed_at,
    event_id = event_id
);

/// An order was cancelled and its stock returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelled {
    pub event_id: EventId,
    pub order_id: OrderId,
    pub tracking_number: String,
    pub reason: String,
    pub cancelled_at: Timestamp,
}

domain_event!(
    OrderCancelled,
    event_type = "order.cancelled.v1",
    schema_version = 1,
    aggregate_id = order_id,
    aggregate_type = "Order",
    occurred_at = cancelled_at,
    event_id = event_id
);
