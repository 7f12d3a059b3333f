//! Order aggregate.
//!
//! An Order bundles the customer, both addresses and the line items into
//! one unit that is committed in a single transaction.
//!
//! # Design Decisions
//!
//! - **Money in cents**: totals are `Money` (i64 minor units), never floats
//! - **Totals are derived**: `total_quantity` and `total_price` always equal
//!   the sums over `items`; every mutation of `items` recomputes them
//! - **Items sorted by product**: lines are unique per product and kept in
//!   product-id order so persistence and comparison are deterministic

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    Money, OrderId, OrderTrackingNumber, ProductId, StateMachine, Timestamp, ValidationError,
};

use super::{Address, CheckoutError, Customer, OrderItem, OrderStatus};

/// Sums quantities and line totals. Sums that do not fit are a validation
/// failure: they can only come from client-supplied prices and quantities.
pub fn compute_totals(items: &[OrderItem]) -> Result<(u32, Money), CheckoutError> {
    let mut quantity: u32 = 0;
    let mut price = Money::ZERO;
    for item in items {
        quantity = quantity
            .checked_add(item.quantity())
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "total_quantity",
                    "exceeds the largest supported quantity",
                )
            })?;
        price = item
            .line_total()
            .and_then(|line| price.checked_add(line))
            .ok_or_else(|| {
                ValidationError::invalid_format(
                    "total_price",
                    "exceeds the largest supported amount",
                )
            })?;
    }
    Ok((quantity, price))
}

/// A line whose price moved between cart and checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceChange {
    pub product_id: ProductId,
    pub cart_price: Money,
    pub current_price: Money,
}

/// Order aggregate.
///
/// # Invariants
///
/// - at least one item; at most one item per product
/// - `total_quantity == Σ item.quantity`
/// - `total_price == Σ item.unit_price × item.quantity`
/// - status changes follow [`OrderStatus`] transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,

    /// Public handle returned to the shopper.
    pub tracking_number: OrderTrackingNumber,

    pub customer: Customer,

    pub shipping_address: Address,

    pub billing_address: Address,

    /// Lines sorted by product id.
    pub items: Vec<OrderItem>,

    pub total_quantity: u32,

    pub total_price: Money,

    /// Lowercase ISO 4217 code.
    pub currency: String,

    pub status: OrderStatus,

    /// Processor intent paying for this order, once created.
    pub payment_intent_id: Option<String>,

    /// Reason reported with the most recent failed payment attempt.
    pub last_payment_error: Option<String>,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

impl Order {
    /// Creates an order awaiting payment. Callers go through the
    /// `OrderAggregateBuilder`, which validates the inputs first.
    pub(super) fn new(
        customer: Customer,
        shipping_address: Address,
        billing_address: Address,
        mut items: Vec<OrderItem>,
        currency: String,
    ) -> Result<Self, CheckoutError> {
        items.sort_by_key(|item| item.product_id());
        let (total_quantity, total_price) = compute_totals(&items)?;
        let now = Timestamp::now();
        Ok(Self {
            id: OrderId::new(),
            tracking_number: OrderTrackingNumber::generate(),
            customer,
            shipping_address,
            billing_address,
            items,
            total_quantity,
            total_price,
            currency,
            status: OrderStatus::AwaitingPayment,
            payment_intent_id: None,
            last_payment_error: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces cart prices with catalog prices and recomputes totals.
    ///
    /// Returns the lines whose price changed. Products missing from
    /// `catalog_prices` are reported as `ProductNotFound`.
    pub fn reprice(
        &mut self,
        catalog_prices: &HashMap<ProductId, Money>,
    ) -> Result<Vec<PriceChange>, CheckoutError> {
        let mut changes = Vec::new();
        let mut repriced = Vec::with_capacity(self.items.len());
        for item in &self.items {
            let current = *catalog_prices
                .get(&item.product_id())
                .ok_or(CheckoutError::ProductNotFound(item.product_id()))?;
            if current != item.unit_price() {
                changes.push(PriceChange {
                    product_id: item.product_id(),
                    cart_price: item.unit_price(),
                    current_price: current,
                });
            }
            repriced.push(item.repriced(current));
        }
        let (quantity, price) = compute_totals(&repriced)?;
        self.items = repriced;
        self.total_quantity = quantity;
        self.total_price = price;
        Ok(changes)
    }

    /// Records the intent that will pay for this order.
    pub fn attach_payment_intent(&mut self, intent_id: impl Into<String>) {
        self.payment_intent_id = Some(intent_id.into());
        self.updated_at = Timestamp::now();
    }

    /// Payment captured.
    pub fn mark_paid(&mut self) -> Result<(), CheckoutError> {
        self.transition(OrderStatus::Paid)?;
        self.last_payment_error = None;
        Ok(())
    }

    /// Payment attempt declined or errored at the processor.
    pub fn mark_payment_failed(&mut self, reason: impl Into<String>) -> Result<(), CheckoutError> {
        self.transition(OrderStatus::PaymentFailed)?;
        self.last_payment_error = Some(reason.into());
        Ok(())
    }

    /// Abandon the order. The caller releases reserved stock.
    pub fn cancel(&mut self) -> Result<(), CheckoutError> {
        self.transition(OrderStatus::Cancelled)
    }

    fn transition(&mut self, target: OrderStatus) -> Result<(), CheckoutError> {
        self.status = self
            .status
            .transition_to(target)
            .map_err(|_| CheckoutError::InvalidTransition {
                from: self.status,
                to: target,
            })?;
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
