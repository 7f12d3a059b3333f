//! Shared fixtures for checkout handler tests.

use crate::domain::checkout::{Address, Customer, OrderItem, OrderSummary, Purchase};
use crate::domain::foundation::{Money, ProductId};
use crate::ports::CatalogProduct;

pub fn cart_item(product: i64, cents: i64, quantity: u32) -> OrderItem {
    OrderItem::new(
        ProductId::new(product).unwrap(),
        format!("assets/images/products/{}.png", product),
        Money::from_cents(cents).unwrap(),
        quantity,
    )
    .unwrap()
}

pub fn catalog_product(id: i64, cents: i64, stock: u32) -> CatalogProduct {
    CatalogProduct {
        id: ProductId::new(id).unwrap(),
        name: format!("Product {}", id),
        unit_price: Money::from_cents(cents).unwrap(),
        active: true,
        units_in_stock: stock,
    }
}

/// Purchase whose summary matches `items`.
pub fn purchase(items: Vec<OrderItem>) -> Purchase {
    purchase_for("ada@example.com", items)
}

pub fn purchase_for(email: &str, items: Vec<OrderItem>) -> Purchase {
    let total_quantity = items.iter().map(OrderItem::quantity).sum();
    let total_cents = items
        .iter()
        .map(|i| i.unit_price().cents() * i64::from(i.quantity()))
        .sum();
    Purchase {
        customer: Customer::new("Ada", "Lovelace", email).unwrap(),
        shipping_address: Address::new("1 Main St", "Springfield", "IL", "US", "62701").unwrap(),
        billing_address: Address::new("9 Elm Rd", "Shelbyville", "IL", "US", "62565").unwrap(),
        order: OrderSummary {
            total_price: Money::from_cents(total_cents).unwrap(),
            total_quantity,
        },
        order_items: items.into_iter().collect(),
    }
}
