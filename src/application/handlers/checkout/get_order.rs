//! GetOrderHandler - Query handler for a single order by tracking number.

use std::sync::Arc;

use crate::domain::checkout::{CheckoutError, Order};
use crate::domain::foundation::OrderTrackingNumber;
use crate::ports::OrderRepository;

/// Query to get one order.
#[derive(Debug, Clone)]
pub struct GetOrderQuery {
    /// Tracking number as the shopper typed it.
    pub tracking_number: String,
}

pub type GetOrderResult = Order;

pub struct GetOrderHandler {
    orders: Arc<dyn OrderRepository>,
}

impl GetOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, query: GetOrderQuery) -> Result<GetOrderResult, CheckoutError> {
        let tracking_number = OrderTrackingNumber::parse(&query.tracking_number)?;
        self.orders
            .find_by_tracking_number(&tracking_number)
            .await?
            .ok_or_else(|| CheckoutError::OrderNotFound(tracking_number.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryOrderRepository;
    use crate::application::handlers::checkout::test_support::{cart_item, purchase};
    use crate::domain::checkout::OrderAggregateBuilder;

    #[tokio::test]
    async fn finds_order_regardless_of_case() {
        let repo = Arc::new(InMemoryOrderRepository::new());
        let order = OrderAggregateBuilder::new(purchase(vec![cart_item(1, 250, 4)]))
            .build()
            .unwrap();
        repo.save(&order).await.unwrap();

        let handler = GetOrderHandler::new(repo);
        let found = handler
            .handle(GetOrderQuery {
                tracking_number: order.tracking_number.as_str().to_uppercase(),
            })
            .await
            .unwrap();

        assert_eq!(found.id, order.id);
        assert_eq!(found.total_price.cents(), 1000);
    }

    #[tokio::test]
    async fn unknown_tracking_number_is_not_found() {
        let handler = GetOrderHandler::new(Arc::new(InMemoryOrderRepository::new()));
        let tracking = OrderTrackingNumber::generate();

        let err = handler
            .handle(GetOrderQuery {
                tracking_number: tracking.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, CheckoutError::OrderNotFound(tracking.to_string()));
    }

    #[tokio::test]
    async fn malformed_tracking_number_is_a_validation_error() {
        let handler = GetOrderHandler::new(Arc::new(InMemoryOrderRepository::new()));
        let err = handler
            .handle(GetOrderQuery {
                tracking_number: "not-a-uuid".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CheckoutError::Validation(_)));
    }
}
