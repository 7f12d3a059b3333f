//! CheckoutService - the storefront-facing checkout contract.
//!
//! The HTTP layer and integration tests talk to this trait; the
//! implementation delegates to the command handlers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::checkout::{
    CheckoutError, PaymentInfo, PaymentIntent, Purchase, PurchaseResponse,
};

use super::handlers::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, PlaceOrderCommand, PlaceOrderHandler,
};

#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Validates the purchase, reserves stock, opens a payment intent and
    /// commits the order.
    async fn place_order(&self, purchase: Purchase) -> Result<PurchaseResponse, CheckoutError>;

    /// Opens a payment intent for `info`.
    ///
    /// # Errors
    ///
    /// `CheckoutError::Payment` with the processor's error kind when the
    /// gateway refuses or fails the call.
    async fn create_payment_intent(
        &self,
        info: PaymentInfo,
    ) -> Result<PaymentIntent, CheckoutError>;
}

/// `CheckoutService` backed by the command handlers.
pub struct CheckoutServiceImpl {
    place_order: Arc<PlaceOrderHandler>,
    create_payment_intent: Arc<CreatePaymentIntentHandler>,
}

impl CheckoutServiceImpl {
    pub fn new(
        place_order: Arc<PlaceOrderHandler>,
        create_payment_intent: Arc<CreatePaymentIntentHandler>,
    ) -> Self {
        Self {
            place_order,
            create_payment_intent,
        }
    }
}

#[async_trait]
impl CheckoutService for CheckoutServiceImpl {
    async fn place_order(&self, purchase: Purchase) -> Result<PurchaseResponse, CheckoutError> {
        self.place_order
            .handle(PlaceOrderCommand { purchase })
            .await
    }

    async fn create_payment_intent(
        &self,
        info: PaymentInfo,
    ) -> Result<PaymentIntent, CheckoutError> {
        self.create_payment_intent
            .handle(CreatePaymentIntentCommand { info })
            .await
    }
}
