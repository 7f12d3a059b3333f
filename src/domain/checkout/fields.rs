//! Shared text-field rules for checkout forms.

use crate::domain::foundation::ValidationError;

/// Minimum length for names, streets, cities and postal codes.
pub const MIN_TEXT_LEN: usize = 2;

/// Trims `value` and requires at least `min` characters.
///
/// Whitespace-only input counts as empty.
pub fn required_text(field: &str, value: &str, min: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::empty_field(field));
    }
    if trimmed.chars().count() < min {
        return Err(ValidationError::too_short(field, min));
    }
    Ok(trimmed.to_string())
}
