//! OrderHistoryHandler - Orders placed under one e-mail address.

use std::sync::Arc;

use crate::domain::checkout::{normalize_email, CheckoutError, Order};
use crate::ports::OrderRepository;

#[derive(Debug, Clone)]
pub struct OrderHistoryQuery {
    pub email: String,
}

/// Orders, newest first.
pub type OrderHistoryResult = Vec<Order>;

pub struct OrderHistoryHandler {
    orders: Arc<dyn OrderRepository>,
}

impl OrderHistoryHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(
        &self,
        query: OrderHistoryQuery,
    ) -> Result<OrderHistoryResult, CheckoutError> {
        let email = normalize_email(&query.email)?;
        Ok(self.orders.list_by_customer_email(&email).await?)
    }
}
