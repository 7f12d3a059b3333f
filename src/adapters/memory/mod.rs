//! In-memory adapters for tests and running without a database.

mod catalog;
mod order_repository;
mod webhook_event_repository;

pub use catalog::InMemoryCatalog;
pub use order_repository::InMemoryOrderRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;
