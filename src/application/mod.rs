//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod checkout_service;
pub mod handlers;
pub mod retry;

pub use checkout_service::{CheckoutService, CheckoutServiceImpl};
pub use handlers::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, GetOrderHandler, GetOrderQuery,
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
    OrderHistoryHandler, OrderHistoryQuery, PlaceOrderCommand, PlaceOrderHandler,
    PlaceOrderSettings,
};
pub use retry::{retry_transient, RetryPolicy, Transient};
