//! PostgreSQL adapters - database implementations of the persistence ports.
//!
//! - `PostgresOrderRepository` - orders with customer, addresses and items
//! - `PostgresProductCatalog` - catalog prices and availability
//! - `PostgresStockReservations` - guarded stock decrements
//! - `PostgresWebhookEventRepository` - processed-webhook ledger

mod order_repository;
mod product_catalog;
mod stock_reservations;
mod webhook_event_repository;

pub use order_repository::PostgresOrderRepository;
pub use product_catalog::PostgresProductCatalog;
pub use stock_reservations::PostgresStockReservations;
pub use webhook_event_repository::PostgresWebhookEventRepository;
