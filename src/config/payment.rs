//! Payment configuration

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::checkout::normalize_currency;

/// Payment configuration (Stripe).
///
/// Without both Stripe keys the service falls back to the mock gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key (sk_...)
    pub stripe_api_key: Option<SecretString>,

    /// Stripe webhook signing secret (whsec_...)
    pub stripe_webhook_secret: Option<SecretString>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Reject webhook events from test mode
    #[serde(default)]
    pub require_livemode: bool,

    /// ISO 4217 currency orders are charged in
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Timeout for each call to the Stripe API
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Allow the mock gateway in front of a real database. The mock accepts
    /// unsigned webhooks.
    #[serde(default)]
    pub use_mock_gateway: bool,
}

impl PaymentConfig {
    /// Both Stripe secrets are present.
    pub fn stripe_enabled(&self) -> bool {
        self.stripe_api_key.is_some() && self.stripe_webhook_secret.is_some()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key
            .as_ref()
            .is_some_and(|key| key.expose_secret().starts_with("sk_test_"))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (&self.stripe_api_key, &self.stripe_webhook_secret) {
            (None, None) => {}
            (Some(key), Some(secret)) => {
                if !key.expose_secret().starts_with("sk_") {
                    return Err(ValidationError::InvalidStripeKey);
                }
                if !secret.expose_secret().starts_with("whsec_") {
                    return Err(ValidationError::InvalidStripeWebhookSecret);
                }
            }
            _ => return Err(ValidationError::IncompleteStripeKeys),
        }

        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(ValidationError::InvalidStripeBaseUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        normalize_currency(&self.currency)
            .map_err(|_| ValidationError::InvalidCurrency(self.currency.clone()))?;
        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_api_key: None,
            stripe_webhook_secret: None,
            api_base_url: default_api_base_url(),
            require_livemode: false,
            currency: default_currency(),
            request_timeout_secs: default_request_timeout(),
            use_mock_gateway: false,
        }
    }
}

fn default_api_base_url() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_request_timeout() -> u64 {
    8
}
