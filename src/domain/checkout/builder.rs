//! Order Aggregate Builder.
//!
//! Turns a validated [`Purchase`] into an [`Order`] snapshot: one item per
//! product, totals that agree with the shopper's summary, and a fresh
//! tracking number.

use std::collections::HashSet;

use super::order::compute_totals;
use super::payment::normalize_currency;
use super::{CheckoutError, Order, OrderItem, Purchase};

/// Default ceiling on distinct lines per order.
pub const DEFAULT_MAX_ITEMS: usize = 100;

pub struct OrderAggregateBuilder {
    purchase: Purchase,
    currency: String,
    max_items: usize,
}

impl OrderAggregateBuilder {
    pub fn new(purchase: Purchase) -> Self {
        Self {
            purchase,
            currency: "usd".to_string(),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
    }

    /// Validates the purchase and assembles the aggregate.
    ///
    /// # Errors
    ///
    /// - `EmptyCart` when there are no items
    /// - `TooManyItems` above the line limit
    /// - `DuplicateProduct` when two distinct lines share a product
    /// - `TotalsMismatch` when the summary disagrees with the items
    /// - `Validation` for a bad currency or totals too large to represent
    pub fn build(self) -> Result<Order, CheckoutError> {
        let Purchase {
            customer,
            shipping_address,
            billing_address,
            order: summary,
            order_items,
        } = self.purchase;

        if order_items.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        if order_items.len() > self.max_items {
            return Err(CheckoutError::TooManyItems {
                max: self.max_items,
            });
        }

        let items: Vec<OrderItem> = order_items.into_iter().collect();
        let mut seen = HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(item.product_id()) {
                return Err(CheckoutError::DuplicateProduct(item.product_id()));
            }
        }

        let (quantity, price) = compute_totals(&items)?;
        if quantity != summary.total_quantity {
            return Err(CheckoutError::totals_mismatch(
                "total_quantity",
                summary.total_quantity,
                quantity,
            ));
        }
        if price != summary.total_price {
            return Err(CheckoutError::totals_mismatch(
                "total_price",
                summary.total_price,
                price,
            ));
        }

        let currency = normalize_currency(&self.currency)?;
        let order = Order::new(customer, shipping_address, billing_address, items, currency)?;

        tracing::debug!(
            tracking_number = %order.tracking_number,
            lines = order.items.len(),
            total = %order.total_price,
            "Order aggregate built"
        );

        Ok(order)
    }
}
