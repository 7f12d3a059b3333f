//! Checkout handlers.
//!
//! ## Commands
//! - Placing an order (the checkout orchestrator)
//! - Creating a standalone payment intent
//! - Processing payment webhooks
//!
//! ## Queries
//! - Get an order by tracking number
//! - Order history for a customer

mod create_payment_intent;
mod get_order;
mod handle_payment_webhook;
mod order_history;
mod place_order;

#[cfg(test)]
pub(crate) mod test_support;

// Commands
pub use create_payment_intent::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
};
pub use place_order::{PlaceOrderCommand, PlaceOrderHandler, PlaceOrderResult, PlaceOrderSettings};

// Queries
pub use get_order::{GetOrderHandler, GetOrderQuery, GetOrderResult};
pub use order_history::{OrderHistoryHandler, OrderHistoryQuery, OrderHistoryResult};
