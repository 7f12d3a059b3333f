//! Foundation module - Shared domain primitives.
//!
//! Identifiers, money, time, events and error types that form the
//! vocabulary of the checkout domain.

mod errors;
mod events;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{AddressId, CustomerId, OrderId, OrderTrackingNumber, ProductId};
pub use money::Money;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
