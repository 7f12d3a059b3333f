//! In-memory OrderRepository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::checkout::{Order, OrderStatus};
use crate::domain::foundation::{CustomerId, DomainError, ErrorCode, OrderId, OrderTrackingNumber};
use crate::ports::{OrderRepository, UpdateResult};

/// Orders kept in a map, with customers matched by e-mail the way the
/// relational schema does it.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    state: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    orders: HashMap<OrderId, Order>,
    customers_by_email: HashMap<String, CustomerId>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.orders.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        let mut store = self.state.write().await;
        if store
            .orders
            .values()
            .any(|o| o.tracking_number == order.tracking_number || o.id == order.id)
        {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Order {} already exists", order.tracking_number),
            ));
        }

        let email = order.customer.email().to_string();
        let customer_id = *store
            .customers_by_email
            .entry(email)
            .or_insert_with(|| order.customer.id().unwrap_or_default());

        let mut stored = order.clone();
        stored.customer = stored.customer.with_id(customer_id);
        stored.shipping_address = stored
            .shipping_address
            .clone()
            .with_id(order.shipping_address.id().unwrap_or_default());
        stored.billing_address = stored
            .billing_address
            .clone()
            .with_id(order.billing_address.id().unwrap_or_default());

        store.orders.insert(stored.id, stored);
        Ok(())
    }

    async fn update(
        &self,
        order: &Order,
        expected: OrderStatus,
    ) -> Result<UpdateResult, DomainError> {
        let mut store = self.state.write().await;
        let stored = store.orders.get_mut(&order.id).ok_or_else(|| {
            DomainError::new(ErrorCode::OrderNotFound, order.tracking_number.to_string())
        })?;
        if stored.status != expected {
            return Ok(UpdateResult::StatusChanged);
        }
        stored.status = order.status;
        stored.payment_intent_id = order.payment_intent_id.clone();
        stored.last_payment_error = order.last_payment_error.clone();
        stored.updated_at = order.updated_at;
        Ok(UpdateResult::Updated)
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &OrderTrackingNumber,
    ) -> Result<Option<Order>, DomainError> {
        let store = self.state.read().await;
        Ok(store
            .orders
            .values()
            .find(|o| &o.tracking_number == tracking_number)
            .cloned())
    }

    async fn find_by_payment_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Order>, DomainError> {
        let store = self.state.read().await;
        Ok(store
            .orders
            .values()
            .find(|o| o.payment_intent_id.as_deref() == Some(intent_id))
            .cloned())
    }

    async fn list_by_customer_email(&self, email: &str) -> Result<Vec<Order>, DomainError> {
        let store = self.state.read().await;
        let mut orders: Vec<Order> = store
            .orders
            .values()
            .filter(|o| o.customer.email() == email)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}
