//! StockReservations port - hold inventory while an order awaits payment.
//!
//! A reservation decrements available stock. It is either taken for every
//! line or for none of them.

use async_trait::async_trait;

use crate::domain::checkout::{CheckoutError, Order};
use crate::domain::foundation::{DomainError, ProductId};

/// Quantity of one product to reserve or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

impl StockLine {
    /// One line per order item.
    pub fn from_order(order: &Order) -> Vec<StockLine> {
        order
            .items
            .iter()
            .map(|item| StockLine {
                product_id: item.product_id(),
                quantity: item.quantity(),
            })
            .collect()
    }
}

#[async_trait]
pub trait StockReservations: Send + Sync {
    /// Reserve every line, or none.
    ///
    /// # Errors
    ///
    /// - `InsufficientStock` for the first line that cannot be covered
    /// - `ProductNotFound` for an unknown product
    /// - `Infrastructure` on storage failure
    async fn reserve(&self, lines: &[StockLine]) -> Result<(), CheckoutError>;

    /// Return previously reserved stock.
    async fn release(&self, lines: &[StockLine]) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_reservations_is_object_safe() {
        fn _accepts_dyn(_stock: &dyn StockReservations) {}
    }
}
