//! OrderRepository port - persistence for the Order aggregate.

use async_trait::async_trait;

use crate::domain::checkout::{Order, OrderStatus};
use crate::domain::foundation::{DomainError, OrderTrackingNumber};

/// Result of a guarded status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateResult {
    Updated,
    /// The stored status no longer matched; nothing was written.
    StatusChanged,
}

/// Repository port for Order aggregates.
///
/// `save` writes the customer, both addresses, the order and its items as
/// one unit: either everything is stored or nothing is. Customers are
/// matched by e-mail, so repeat shoppers keep a single record.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order with all of its parts.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the tracking number is already taken
    /// - `DatabaseError` on persistence failure
    async fn save(&self, order: &Order) -> Result<(), DomainError>;

    /// Persist status, payment intent and failure reason of an existing
    /// order, provided its stored status is still `expected`. The check and
    /// the write are atomic.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order doesn't exist
    async fn update(
        &self,
        order: &Order,
        expected: OrderStatus,
    ) -> Result<UpdateResult, DomainError>;

    async fn find_by_tracking_number(
        &self,
        tracking_number: &OrderTrackingNumber,
    ) -> Result<Option<Order>, DomainError>;

    async fn find_by_payment_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Order>, DomainError>;

    /// Orders placed with this e-mail, newest first.
    async fn list_by_customer_email(&self, email: &str) -> Result<Vec<Order>, DomainError>;
}
