//! HTTP adapters - REST API implementations.

pub mod checkout;
pub mod error;

pub use checkout::{checkout_router, health, CheckoutAppState};
pub use error::{ApiError, ErrorResponse};
