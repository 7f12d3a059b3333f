//! Payment value types shared by the checkout flow and the gateway port.
//!
//! The processor's own representations stay inside the Stripe adapter; the
//! types here are what the rest of the crate sees.

use serde::{Deserialize, Serialize};

use super::customer::normalize_email;
use crate::domain::foundation::{Money, ValidationError};

/// Normalizes an ISO 4217 currency code to the lowercase form the
/// processor expects.
pub fn normalize_currency(raw: &str) -> Result<String, ValidationError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(ValidationError::empty_field("currency"));
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::invalid_format(
            "currency",
            "expected a three-letter ISO 4217 code",
        ));
    }
    Ok(code.to_ascii_lowercase())
}

/// What the shopper is about to pay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfo {
    amount: Money,
    currency: String,
    receipt_email: Option<String>,
}

impl PaymentInfo {
    /// Validates a payment request. The amount must be positive.
    pub fn new(
        amount: Money,
        currency: &str,
        receipt_email: Option<&str>,
    ) -> Result<Self, ValidationError> {
        if amount.is_zero() {
            return Err(ValidationError::out_of_range("amount", 1, i64::MAX, 0));
        }
        let receipt_email = receipt_email
            .filter(|e| !e.trim().is_empty())
            .map(normalize_email)
            .transpose()?;
        Ok(Self {
            amount,
            currency: normalize_currency(currency)?,
            receipt_email,
        })
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn receipt_email(&self) -> Option<&str> {
        self.receipt_email.as_deref()
    }
}

/// Processor-side lifecycle of a payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Unknown,
}

impl PaymentIntentStatus {
    /// Maps the processor's status string.
    pub fn parse(s: &str) -> Self {
        match s {
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_action" => Self::RequiresAction,
            "processing" => Self::Processing,
            "requires_capture" => Self::RequiresCapture,
            "canceled" => Self::Canceled,
            "succeeded" => Self::Succeeded,
            _ => Self::Unknown,
        }
    }

    /// Whether the intent can still be cancelled.
    pub fn is_cancellable(&self) -> bool {
        !matches!(self, Self::Canceled | Self::Succeeded)
    }
}

/// An in-progress charge authorization held by the payment processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Processor's intent ID (pi_...).
    pub id: String,

    /// Secret the browser uses to confirm the intent.
    pub client_secret: Option<String>,

    /// Amount in minor units.
    pub amount: Money,

    pub currency: String,

    pub status: PaymentIntentStatus,

    /// Unix timestamp at the processor.
    pub created: i64,
}

/// Errors from payment processor operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentError {
    /// Error code for categorization.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Processor's own error or decline code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl PaymentError {
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    pub fn card_declined(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::CardDeclined, message)
    }

    pub fn not_found(resource: &str) -> Self {
        Self::new(PaymentErrorCode::NotFound, format!("{} not found", resource))
    }

    pub fn invalid_webhook(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::InvalidWebhook, message)
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Local failure kinds for payment processor calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentErrorCode {
    /// Processor could not be reached.
    NetworkError,

    /// API key rejected.
    AuthenticationError,

    CardDeclined,

    InsufficientFunds,

    CardExpired,

    InvalidCard,

    /// Request rejected as malformed by the processor.
    InvalidRequest,

    NotFound,

    RateLimitExceeded,

    /// Same idempotency key reused with different parameters.
    IdempotencyConflict,

    /// Processor returned a 5xx.
    ProviderUnavailable,

    /// Invalid webhook signature or payload.
    InvalidWebhook,

    /// Any other processor API error.
    ProviderError,

    Unknown,
}

impl PaymentErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError
                | PaymentErrorCode::RateLimitExceeded
                | PaymentErrorCode::ProviderUnavailable
        )
    }

    /// Whether the shopper's payment method was refused.
    pub fn is_card_error(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::CardDeclined
                | PaymentErrorCode::InsufficientFunds
                | PaymentErrorCode::CardExpired
                | PaymentErrorCode::InvalidCard
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::CardDeclined => "card_declined",
            PaymentErrorCode::InsufficientFunds => "insufficient_funds",
            PaymentErrorCode::CardExpired => "card_expired",
            PaymentErrorCode::InvalidCard => "invalid_card",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::NotFound => "not_found",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::IdempotencyConflict => "idempotency_conflict",
            PaymentErrorCode::ProviderUnavailable => "provider_unavailable",
            PaymentErrorCode::InvalidWebhook => "invalid_webhook",
            PaymentErrorCode::ProviderError => "provider_error",
            PaymentErrorCode::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_is_lowercased() {
        assert_eq!(normalize_currency(" USD ").unwrap(), "usd");
    }

    #[test]
    fn currency_must_be_three_letters() {
        assert!(normalize_currency("US").is_err());
        assert!(normalize_currency("US1").is_err());
        assert!(normalize_currency("").is_err());
    }

    #[test]
    fn payment_info_rejects_zero_amount() {
        assert!(PaymentInfo::new(Money::ZERO, "usd", None).is_err());
    }

    #[test]
    fn payment_info_normalizes_receipt_email() {
        let info = PaymentInfo::new(Money::from_cents(500).unwrap(), "EUR", Some("A@B.io")).unwrap();
        assert_eq!(info.currency(), "eur");
        assert_eq!(info.receipt_email(), Some("a@b.io"));
    }

    #[test]
    fn payment_info_treats_blank_email_as_absent() {
        let info = PaymentInfo::new(Money::from_cents(500).unwrap(), "usd", Some("  ")).unwrap();
        assert!(info.receipt_email().is_none());
    }

    #[test]
    fn intent_status_parses_processor_strings() {
        assert_eq!(
            PaymentIntentStatus::parse("requires_payment_method"),
            PaymentIntentStatus::RequiresPaymentMethod
        );
        assert_eq!(PaymentIntentStatus::parse("succeeded"), PaymentIntentStatus::Succeeded);
        assert_eq!(PaymentIntentStatus::parse("something_new"), PaymentIntentStatus::Unknown);
    }

    #[test]
    fn succeeded_intent_is_not_cancellable() {
        assert!(!PaymentIntentStatus::Succeeded.is_cancellable());
        assert!(PaymentIntentStatus::RequiresPaymentMethod.is_cancellable());
    }

    #[test]
    fn payment_error_retryable() {
        assert!(PaymentErrorCode::NetworkError.is_retryable());
        assert!(PaymentErrorCode::ProviderUnavailable.is_retryable());
        assert!(!PaymentErrorCode::CardDeclined.is_retryable());
        assert!(!PaymentErrorCode::IdempotencyConflict.is_retryable());
        assert!(PaymentError::network("timeout").is_retryable());
    }

    #[test]
    fn payment_error_display() {
        let err = PaymentError::card_declined("Your card was declined").with_provider_code("do_not_honor");
        assert_eq!(err.to_string(), "card_declined: Your card was declined");
        assert_eq!(err.provider_code.as_deref(), Some("do_not_honor"));
    }
}
