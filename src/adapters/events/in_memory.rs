//! In-memory event bus.
//!
//! Keeps every published envelope in order so tests can assert on what the
//! checkout flow emitted.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

/// In-memory event bus for tests and local runs.
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// bus.publish(envelope).await?;
/// assert!(bus.has_event("order.placed.v1"));
/// ```
#[derive(Default)]
pub struct InMemoryEventBus {
    published: RwLock<Vec<EventEnvelope>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn events_for_aggregate(&self, aggregate_id: &str) -> Vec<EventEnvelope> {
        self.published_events()
            .into_iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|e| e.event_type == event_type)
    }

    /// Clears all published events (for test isolation).
    pub fn clear(&self) {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        self.published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::OrderCancelled;
    use crate::domain::foundation::{EventId, OrderId, SerializableDomainEvent, Timestamp};

    fn cancelled(order_id: OrderId) -> EventEnvelope {
        OrderCancelled {
            event_id: EventId::new(),
            order_id,
            tracking_number: "t".into(),
            reason: "test".into(),
            cancelled_at: Timestamp::now(),
        }
        .to_envelope()
        .unwrap()
    }

    #[tokio::test]
    async fn captures_published_events_in_order() {
        let bus = InMemoryEventBus::new();
        let first = OrderId::new();
        let second = OrderId::new();

        bus.publish(cancelled(first)).await.unwrap();
        bus.publish_all(vec![cancelled(second)]).await.unwrap();

        assert_eq!(bus.event_count(), 2);
        assert_eq!(bus.published_events()[0].aggregate_id, first.to_string());
        assert_eq!(bus.events_for_aggregate(&second.to_string()).len(), 1);
        assert!(bus.has_event("order.cancelled.v1"));
        assert!(bus.events_of_type("order.paid.v1").is_empty());
    }

    #[tokio::test]
    async fn clear_resets_capture() {
        let bus = InMemoryEventBus::new();
        bus.publish(cancelled(OrderId::new())).await.unwrap();
        bus.clear();
        assert_eq!(bus.event_count(), 0);
    }
}
