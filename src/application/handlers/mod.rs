//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod checkout;

pub use checkout::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
    GetOrderHandler, GetOrderQuery, GetOrderResult, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, HandlePaymentWebhookResult, OrderHistoryHandler,
    OrderHistoryQuery, OrderHistoryResult, PlaceOrderCommand, PlaceOrderHandler,
    PlaceOrderResult, PlaceOrderSettings,
};
