//! Customer entity.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::fields::{required_text, MIN_TEXT_LEN};
use crate::domain::foundation::{CustomerId, ValidationError};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,4}$").expect("email pattern is valid")
});

/// Normalizes and checks an e-mail address.
///
/// Addresses are compared case-insensitively, so they are stored lower-cased.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::empty_field("email"));
    }
    if !EMAIL_RE.is_match(&email) {
        return Err(ValidationError::invalid_format(
            "email",
            "not a valid e-mail address",
        ));
    }
    Ok(email)
}

/// The person placing an order. Customers are keyed by e-mail; a returning
/// shopper reuses the existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    id: Option<CustomerId>,
    first_name: String,
    last_name: String,
    email: String,
}

impl Customer {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id: None,
            first_name: required_text("first_name", first_name, MIN_TEXT_LEN)?,
            last_name: required_text("last_name", last_name, MIN_TEXT_LEN)?,
            email: normalize_email(email)?,
        })
    }

    /// Rebuilds a customer from storage without re-validating.
    pub fn reconstitute(id: CustomerId, first_name: String, last_name: String, email: String) -> Self {
        Self {
            id: Some(id),
            first_name,
            last_name,
            email,
        }
    }

    pub fn with_id(mut self, id: CustomerId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<CustomerId> {
        self.id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> &str {
        &self.last_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
