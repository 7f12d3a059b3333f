//! HTTP adapter for checkout endpoints.
//!
//! - `POST /api/checkout/purchase` - Place an order
//! - `POST /api/checkout/payment-intent` - Open a standalone payment intent
//! - `GET /api/orders?email=` - Order history
//! - `GET /api/orders/:tracking_number` - One order
//! - `POST /api/webhooks/stripe` - Handle Stripe webhooks

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{health, CheckoutAppState, SIGNATURE_HEADER};
pub use routes::{checkout_router, checkout_routes, order_routes, webhook_routes};
