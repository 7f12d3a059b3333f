//! Checkout request and response payloads.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, OrderTrackingNumber};

use super::{Address, Customer, OrderItem};

/// Totals the storefront computed for its cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub total_price: Money,
    pub total_quantity: u32,
}

/// Everything a shopper submits at checkout.
///
/// Items form a set: submitting the same line twice counts once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    pub customer: Customer,
    pub shipping_address: Address,
    pub billing_address: Address,
    pub order: OrderSummary,
    pub order_items: HashSet<OrderItem>,
}

/// Confirmation returned after an order is committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub order_tracking_number: OrderTrackingNumber,

    /// Intent the browser confirms to pay for the order.
    pub payment_intent_id: String,

    pub client_secret: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ProductId;

    #[test]
    fn duplicate_lines_collapse_in_purchase() {
        let line = OrderItem::new(
            ProductId::new(1).unwrap(),
            "a.png",
            Money::from_cents(100).unwrap(),
            1,
        )
        .unwrap();
        let address = Address::new("1 Main St", "Springfield", "IL", "US", "62701").unwrap();

        let purchase = Purchase {
            customer: Customer::new("Ada", "Lovelace", "ada@example.com").unwrap(),
            shipping_address: address.clone(),
            billing_address: address,
            order: OrderSummary {
                total_price: Money::from_cents(100).unwrap(),
                total_quantity: 1,
            },
            order_items: [line.clone(), line.clone()].into_iter().collect(),
        };

        assert_eq!(purchase.order_items.len(), 1);
    }
}
