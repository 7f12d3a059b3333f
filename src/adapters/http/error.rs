//! Error responses for the HTTP API.
//!
//! Every failure is rendered as `{ "code", "message", "details"? }` with a
//! status picked from the error kind.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::checkout::{CheckoutError, PaymentErrorCode};
use crate::domain::foundation::ValidationError;

/// Standard error body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// API error type that converts checkout errors to HTTP responses.
#[derive(Debug)]
pub struct ApiError(pub CheckoutError);

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(CheckoutError::Validation(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            CheckoutError::Validation(_)
            | CheckoutError::EmptyCart
            | CheckoutError::TooManyItems { .. }
            | CheckoutError::DuplicateProduct(_)
            | CheckoutError::TotalsMismatch { .. } => StatusCode::BAD_REQUEST,
            CheckoutError::ProductNotFound(_) | CheckoutError::OrderNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            CheckoutError::ProductUnavailable(_)
            | CheckoutError::PriceChanged { .. }
            | CheckoutError::InsufficientStock { .. }
            | CheckoutError::InvalidTransition { .. } => StatusCode::CONFLICT,
            CheckoutError::Payment(err) => match err.code {
                code if code.is_card_error() => StatusCode::PAYMENT_REQUIRED,
                PaymentErrorCode::InvalidRequest | PaymentErrorCode::InvalidWebhook => {
                    StatusCode::BAD_REQUEST
                }
                _ => StatusCode::BAD_GATEWAY,
            },
            CheckoutError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        let err = &self.0;
        let code = match err {
            CheckoutError::Payment(payment) if payment.code == PaymentErrorCode::InvalidWebhook => {
                "INVALID_WEBHOOK".to_string()
            }
            _ => err.code().to_string(),
        };
        // Internal details stay in the logs
        let message = match err {
            CheckoutError::Infrastructure(_) => "An internal error occurred".to_string(),
            _ => err.message(),
        };
        let response = ErrorResponse::new(code, message);

        match err {
            CheckoutError::Validation(validation) => match validation.field() {
                Some(field) => response.with_details(serde_json::json!({ "field": field })),
                None => response,
            },
            CheckoutError::TotalsMismatch {
                field,
                declared,
                computed,
            } => response.with_details(serde_json::json!({
                "field": field,
                "declared": declared,
                "computed": computed,
            })),
            CheckoutError::PriceChanged {
                product_id,
                cart_price,
                current_price,
            } => response.with_details(serde_json::json!({
                "productId": product_id.value(),
                "cartPrice": cart_price.to_decimal().to_string(),
                "currentPrice": current_price.to_decimal().to_string(),
            })),
            CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            } => response.with_details(serde_json::json!({
                "productId": product_id.value(),
                "requested": requested,
                "available": available,
            })),
            CheckoutError::Payment(payment) => response.with_details(serde_json::json!({
                "paymentCode": payment.code.to_string(),
                "providerCode": payment.provider_code,
                "retryable": payment.retryable,
            })),
            _ => response,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
