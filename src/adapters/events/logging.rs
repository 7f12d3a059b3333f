//! Event publisher that writes envelopes to the tracing pipeline.
//!
//! Used when no message broker is configured: events still leave a
//! structured trail that log shipping can pick up.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventPublisher;

impl LoggingEventPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EventPublisher for LoggingEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        tracing::info!(
            target: "shop_checkout::events",
            event_id = %event.event_id,
            event_type = %event.event_type,
            aggregate_type = %event.aggregate_type,
            aggregate_id = %event.aggregate_id,
            causation_id = ?event.metadata.causation_id,
            payload = %event.payload,
            "Domain event"
        );
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::checkout::OrderPaid;
    use crate::domain::foundation::{EventId, Money, OrderId, SerializableDomainEvent, Timestamp};

    #[tokio::test]
    async fn publishing_never_fails() {
        let envelope = OrderPaid {
            event_id: EventId::new(),
            order_id: OrderId::new(),
            tracking_number: "t".into(),
            payment_intent_id: "pi_1".into(),
            amount: Money::from_cents(100).unwrap(),
            paid_at: Timestamp::now(),
        }
        .to_envelope()
        .unwrap();

        let publisher = LoggingEventPublisher::new();
        assert!(publisher.publish(envelope.clone()).await.is_ok());
        assert!(publisher.publish_all(vec![envelope]).await.is_ok());
    }
}
