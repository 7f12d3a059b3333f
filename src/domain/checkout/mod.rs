//! Checkout domain - orders, their parties, and payment value types.

mod address;
mod builder;
mod customer;
mod errors;
mod events;
mod fields;
mod order;
mod order_item;
mod payment;
mod purchase;
mod status;

pub use address::Address;
pub use builder::{OrderAggregateBuilder, DEFAULT_MAX_ITEMS};
pub use customer::{normalize_email, Customer};
pub use errors::CheckoutError;
pub use events::{OrderCancelled, OrderPaid, OrderPaymentFailed, OrderPlaced};
pub use order::{compute_totals, Order, PriceChange};
pub use order_item::{OrderItem, MAX_QUANTITY};
pub use payment::{
    normalize_currency, PaymentError, PaymentErrorCode, PaymentInfo, PaymentIntent,
    PaymentIntentStatus,
};
pub use purchase::{OrderSummary, Purchase, PurchaseResponse};
pub use status::OrderStatus;
