//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `CHECKOUT` prefix and
//! `__` between nesting levels.
//!
//! # Example
//!
//! ```no_run
//! use shop_checkout::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod checkout;
mod database;
mod error;
mod payment;
mod server;

pub use checkout::CheckoutConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use payment::PaymentConfig;
pub use server::{LogFormat, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL; in-memory adapters are used when absent
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub payment: PaymentConfig,

    #[serde(default)]
    pub checkout: CheckoutConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `CHECKOUT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `CHECKOUT__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `CHECKOUT__DATABASE__URL=...` -> `database.url = ...`
    /// - `CHECKOUT__PAYMENT__STRIPE_API_KEY=...` -> `payment.stripe_api_key = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a value cannot be parsed into its field.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("CHECKOUT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        if let Some(database) = &self.database {
            database.validate()?;
        }
        self.payment.validate()?;
        self.checkout.validate()?;
        self.check_gateway()?;

        let payment_budget = self
            .checkout
            .retry_policy()
            .worst_case(self.payment.request_timeout());
        if payment_budget >= self.server.request_timeout() {
            return Err(ValidationError::PaymentBudgetExceedsRequestTimeout);
        }
        Ok(())
    }

    /// The mock gateway is only allowed without a database, or when asked
    /// for explicitly.
    pub fn check_gateway(&self) -> Result<(), ValidationError> {
        if self.database.is_some()
            && !self.payment.stripe_enabled()
            && !self.payment.use_mock_gateway
        {
            return Err(ValidationError::MockGatewayWithDatabase);
        }
        Ok(())
    }
}
