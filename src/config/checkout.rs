//! Checkout flow configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::RetryPolicy;

/// Checkout rules and the backoff used for payment-processor calls.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutConfig {
    /// Ceiling on distinct products per order
    #[serde(default = "default_max_items")]
    pub max_items_per_order: usize,

    /// Refuse orders whose cart prices no longer match the catalog
    #[serde(default = "default_reject_price_changes")]
    pub reject_price_changes: bool,

    /// Attempts per processor call, including the first
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    #[serde(default = "default_retry_initial_delay_ms")]
    pub retry_initial_delay_ms: u64,

    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    #[serde(default = "default_retry_multiplier")]
    pub retry_multiplier: f64,

    /// Days to keep processed webhook events
    #[serde(default = "default_webhook_retention_days")]
    pub webhook_retention_days: u32,
}

impl CheckoutConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry_max_attempts,
            initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
            multiplier: self.retry_multiplier,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_items_per_order == 0 || self.max_items_per_order > 1000 {
            return Err(ValidationError::InvalidMaxItems);
        }
        if self.retry_max_attempts == 0 || self.retry_max_attempts > 10 {
            return Err(ValidationError::InvalidRetryPolicy(
                "retry_max_attempts must be between 1 and 10",
            ));
        }
        if self.retry_initial_delay_ms > self.retry_max_delay_ms {
            return Err(ValidationError::InvalidRetryPolicy(
                "retry_initial_delay_ms exceeds retry_max_delay_ms",
            ));
        }
        if !(1.0..=10.0).contains(&self.retry_multiplier) {
            return Err(ValidationError::InvalidRetryPolicy(
                "retry_multiplier must be between 1 and 10",
            ));
        }
        Ok(())
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_items_per_order: default_max_items(),
            reject_price_changes: default_reject_price_changes(),
            retry_max_attempts: default_retry_max_attempts(),
            retry_initial_delay_ms: default_retry_initial_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            retry_multiplier: default_retry_multiplier(),
            webhook_retention_days: default_webhook_retention_days(),
        }
    }
}

fn default_max_items() -> usize {
    100
}

fn default_reject_price_changes() -> bool {
    true
}

fn default_retry_max_attempts() -> u32 {
    3
}

fn default_retry_initial_delay_ms() -> u64 {
    200
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_retry_multiplier() -> f64 {
    2.0
}

fn default_webhook_retention_days() -> u32 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_retry_policy_defaults() {
        let config = CheckoutConfig::default();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_max_items() {
        let config = CheckoutConfig {
            max_items_per_order: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidMaxItems));
    }

    #[test]
    fn test_validation_retry_delays() {
        let config = CheckoutConfig {
            retry_initial_delay_ms: 5000,
            retry_max_delay_ms: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidRetryPolicy(_))
        ));
    }

    #[test]
    fn test_validation_retry_attempts() {
        let config = CheckoutConfig {
            retry_max_attempts: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
