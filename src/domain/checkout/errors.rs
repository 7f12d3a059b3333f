//! Checkout-specific error types.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Validation, EmptyCart, TooManyItems, DuplicateProduct, TotalsMismatch | 400 |
//! | ProductNotFound, OrderNotFound | 404 |
//! | ProductUnavailable, PriceChanged, InsufficientStock, InvalidTransition | 409 |
//! | Payment (card errors) | 402 |
//! | Payment (processor errors) | 502 |
//! | Infrastructure | 500 |

use crate::domain::foundation::{
    DomainError, ErrorCode, Money, ProductId, ValidationError,
};

use super::payment::PaymentError;
use super::status::OrderStatus;

/// Everything that can go wrong while placing or settling an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    /// A field of the purchase failed validation.
    Validation(ValidationError),

    /// The purchase contained no items.
    EmptyCart,

    /// More distinct lines than the configured limit.
    TooManyItems { max: usize },

    /// Two different lines name the same product.
    DuplicateProduct(ProductId),

    /// The client's order summary disagrees with its own line items.
    TotalsMismatch {
        field: &'static str,
        declared: String,
        computed: String,
    },

    ProductNotFound(ProductId),

    /// The product exists but is not for sale.
    ProductUnavailable(ProductId),

    /// The catalog price differs from the price in the cart.
    PriceChanged {
        product_id: ProductId,
        cart_price: Money,
        current_price: Money,
    },

    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    OrderNotFound(String),

    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The payment processor refused or failed the call.
    Payment(PaymentError),

    Infrastructure(String),
}

impl CheckoutError {
    pub fn infrastructure(message: impl Into<String>) -> Self {
        CheckoutError::Infrastructure(message.into())
    }

    pub fn totals_mismatch(
        field: &'static str,
        declared: impl ToString,
        computed: impl ToString,
    ) -> Self {
        CheckoutError::TotalsMismatch {
            field,
            declared: declared.to_string(),
            computed: computed.to_string(),
        }
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CheckoutError::Validation(_) => ErrorCode::ValidationFailed,
            CheckoutError::EmptyCart => ErrorCode::EmptyCart,
            CheckoutError::TooManyItems { .. } => ErrorCode::TooManyItems,
            CheckoutError::DuplicateProduct(_) => ErrorCode::DuplicateProduct,
            CheckoutError::TotalsMismatch { .. } => ErrorCode::TotalsMismatch,
            CheckoutError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            CheckoutError::ProductUnavailable(_) => ErrorCode::ProductUnavailable,
            CheckoutError::PriceChanged { .. } => ErrorCode::PriceChanged,
            CheckoutError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CheckoutError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            CheckoutError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            CheckoutError::Payment(err) if err.code.is_card_error() => ErrorCode::PaymentRequired,
            CheckoutError::Payment(_) => ErrorCode::ExternalServiceError,
            CheckoutError::Infrastructure(_) => ErrorCode::InternalError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            CheckoutError::Validation(err) => err.to_string(),
            CheckoutError::EmptyCart => "Order must contain at least one item".to_string(),
            CheckoutError::TooManyItems { max } => {
                format!("Order may contain at most {} different products", max)
            }
            CheckoutError::DuplicateProduct(id) => {
                format!("Product {} appears on more than one line", id)
            }
            CheckoutError::TotalsMismatch {
                field,
                declared,
                computed,
            } => format!(
                "Order {} {} does not match the items ({})",
                field, declared, computed
            ),
            CheckoutError::ProductNotFound(id) => format!("Product {} not found", id),
            CheckoutError::ProductUnavailable(id) => {
                format!("Product {} is no longer available", id)
            }
            CheckoutError::PriceChanged {
                product_id,
                cart_price,
                current_price,
            } => format!(
                "Price of product {} changed from {} to {}",
                product_id, cart_price, current_price
            ),
            CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            } => format!(
                "Only {} of product {} in stock, {} requested",
                available, product_id, requested
            ),
            CheckoutError::OrderNotFound(tracking) => format!("Order not found: {}", tracking),
            CheckoutError::InvalidTransition { from, to } => {
                format!("Cannot move order from {} to {}", from, to)
            }
            CheckoutError::Payment(err) => format!("Payment failed: {}", err.message),
            CheckoutError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if the same request may succeed when repeated.
    pub fn is_retryable(&self) -> bool {
        match self {
            CheckoutError::Payment(err) => err.is_retryable(),
            CheckoutError::Infrastructure(_) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for CheckoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CheckoutError {}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Validation(err)
    }
}

impl From<PaymentError> for CheckoutError {
    fn from(err: PaymentError) -> Self {
        CheckoutError::Payment(err)
    }
}

impl From<DomainError> for CheckoutError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::OrderNotFound => CheckoutError::OrderNotFound(err.message),
            _ => CheckoutError::Infrastructure(err.to_string()),
        }
    }
}

impl From<CheckoutError> for DomainError {
    fn from(err: CheckoutError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
