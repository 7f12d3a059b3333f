//! Ports - Interfaces for external dependencies.
//!
//! Ports define the contracts between the checkout core and the outside
//! world. Adapters implement them.
//!
//! - `PaymentGateway` - payment processor (intents, webhooks)
//! - `OrderRepository` - order aggregate persistence
//! - `ProductCatalog` - current prices and availability
//! - `StockReservations` - inventory held for unpaid orders
//! - `EventPublisher` - domain event delivery
//! - `WebhookEventRepository` - processed-webhook ledger

mod event_publisher;
mod order_repository;
mod payment_gateway;
mod product_catalog;
mod stock_reservation;
mod webhook_event_repository;

pub use event_publisher::EventPublisher;
pub use order_repository::{OrderRepository, UpdateResult};
pub use payment_gateway::{
    CreatePaymentIntentRequest, PaymentError, PaymentErrorCode, PaymentGateway, WebhookEvent,
    WebhookEventData, WebhookEventType,
};
pub use product_catalog::{CatalogProduct, ProductCatalog};
pub use stock_reservation::{StockLine, StockReservations};
pub use webhook_event_repository::{
    SaveResult, WebhookEventRecord, WebhookEventRepository, WebhookOutcome,
};
