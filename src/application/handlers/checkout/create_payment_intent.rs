//! CreatePaymentIntentHandler - Standalone intent creation.
//!
//! Used by storefronts that confirm payment before submitting the purchase.

use std::sync::Arc;

use uuid::Uuid;

use crate::application::retry::{retry_transient, RetryPolicy};
use crate::domain::checkout::{CheckoutError, PaymentInfo, PaymentIntent};
use crate::ports::{CreatePaymentIntentRequest, PaymentGateway};

/// Command to create a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentCommand {
    pub info: PaymentInfo,
}

pub type CreatePaymentIntentResult = PaymentIntent;

pub struct CreatePaymentIntentHandler {
    gateway: Arc<dyn PaymentGateway>,
    retry: RetryPolicy,
}

impl CreatePaymentIntentHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentIntentCommand,
    ) -> Result<CreatePaymentIntentResult, CheckoutError> {
        // One key per command so a retried create cannot charge twice
        let mut request = CreatePaymentIntentRequest::new(cmd.info);
        request.idempotency_key = Some(format!("intent-{}", Uuid::new_v4()));

        let intent = retry_transient(self.retry, |_| {
            self.gateway.create_payment_intent(request.clone())
        })
        .await
        .map_err(|e| {
            tracing::warn!(code = %e.code, error = %e, "Payment intent creation failed");
            CheckoutError::from(e)
        })?;

        tracing::info!(
            payment_intent_id = %intent.id,
            amount_cents = intent.amount.cents(),
            currency = %intent.currency,
            "Payment intent created"
        );
        Ok(intent)
    }
}
