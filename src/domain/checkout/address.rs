//! Postal address entity.

use serde::{Deserialize, Serialize};

use super::fields::{required_text, MIN_TEXT_LEN};
use crate::domain::foundation::{AddressId, ValidationError};

/// A shipping or billing address.
///
/// The identity key is assigned when the address is first persisted. Each
/// order owns its two addresses outright; they are never shared between
/// orders.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    id: Option<AddressId>,
    street: String,
    city: String,
    state: String,
    country: String,
    zip_code: String,
}

impl Address {
    /// Validates and normalizes a new, unpersisted address.
    pub fn new(
        street: &str,
        city: &str,
        state: &str,
        country: &str,
        zip_code: &str,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: None,
            street: required_text("street", street, MIN_TEXT_LEN)?,
            city: required_text("city", city, MIN_TEXT_LEN)?,
            state: required_text("state", state, 1)?,
            country: required_text("country", country, 1)?,
            zip_code: required_text("zip_code", zip_code, MIN_TEXT_LEN)?,
        })
    }

    /// Rebuilds an address from storage without re-validating.
    pub fn reconstitute(
        id: AddressId,
        street: String,
        city: String,
        state: String,
        country: String,
        zip_code: String,
    ) -> Self {
        Self {
            id: Some(id),
            street,
            city,
            state,
            country,
            zip_code,
        }
    }

    /// Assigns the persistence identity.
    pub fn with_id(mut self, id: AddressId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn id(&self) -> Option<AddressId> {
        self.id
    }

    pub fn street(&self) -> &str {
        &self.street
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn state(&self) -> &str {
        &self.state
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }
}
