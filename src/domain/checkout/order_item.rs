//! Order line item.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, ProductId, ValidationError};

/// Upper bound on units of one product in a single order.
pub const MAX_QUANTITY: u32 = 1000;

/// One product line in an order.
///
/// Equality and hashing cover every field, so a `HashSet<OrderItem>` folds
/// identical lines together while keeping lines that differ in any field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderItem {
    product_id: ProductId,
    image_url: String,
    unit_price: Money,
    quantity: u32,
}

impl OrderItem {
    pub fn new(
        product_id: ProductId,
        image_url: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        if quantity == 0 || quantity > MAX_QUANTITY {
            return Err(ValidationError::out_of_range(
                "quantity",
                1,
                i64::from(MAX_QUANTITY),
                i64::from(quantity),
            ));
        }
        Ok(Self {
            product_id,
            image_url: image_url.into().trim().to_string(),
            unit_price,
            quantity,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `unit_price × quantity`, or `None` on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }

    /// Same line at a different unit price.
    pub fn repriced(&self, unit_price: Money) -> Self {
        Self {
            unit_price,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn item(product: i64, cents: i64, quantity: u32) -> OrderItem {
        OrderItem::new(
            ProductId::new(product).unwrap(),
            "assets/images/products/book-1000.png",
            Money::from_cents(cents).unwrap(),
            quantity,
        )
        .unwrap()
    }

    #[test]
    fn rejects_zero_quantity() {
        let err = OrderItem::new(ProductId::new(1).unwrap(), "", Money::ZERO, 0).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn rejects_excessive_quantity() {
        let result = OrderItem::new(
            ProductId::new(1).unwrap(),
            "",
            Money::ZERO,
            MAX_QUANTITY + 1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        assert_eq!(item(1, 1899, 3).line_total().unwrap().cents(), 5697);
    }

    #[test]
    fn set_deduplicates_equal_items() {
        let mut items = HashSet::new();
        items.insert(item(1, 1899, 2));
        items.insert(item(1, 1899, 2));
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn set_keeps_items_differing_in_any_field() {
        let mut items = HashSet::new();
        items.insert(item(1, 1899, 2));
        items.insert(item(1, 1899, 3));
        items.insert(item(1, 1999, 2));
        items.insert(item(2, 1899, 2));
        assert_eq!(items.len(), 4);
    }

    #[test]
    fn repriced_only_changes_price() {
        let original = item(5, 1000, 4);
        let repriced = original.repriced(Money::from_cents(1250).unwrap());
        assert_eq!(repriced.product_id(), original.product_id());
        assert_eq!(repriced.quantity(), 4);
        assert_eq!(repriced.unit_price().cents(), 1250);
    }
}
