//! Adapters - Implementations of port interfaces.
//!
//! - `events` - Event publishers (in-memory, tracing)
//! - `http` - Axum REST API
//! - `memory` - In-memory persistence for tests and database-less runs
//! - `postgres` - PostgreSQL persistence
//! - `stripe` - Stripe payment gateway and its test double

pub mod events;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod stripe;

pub use events::{InMemoryEventBus, LoggingEventPublisher};
pub use memory::{InMemoryCatalog, InMemoryOrderRepository, InMemoryWebhookEventRepository};
pub use stripe::{MockPaymentGateway, StripeConfig, StripePaymentAdapter};
