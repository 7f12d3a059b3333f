//! In-memory product catalog that also tracks stock.
//!
//! One mutex guards all products, so a reservation checks and decrements
//! every line without interleaving with another checkout.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::{DomainError, Money, ProductId};
use crate::ports::{CatalogProduct, ProductCatalog, StockLine, StockReservations};

#[derive(Default)]
pub struct InMemoryCatalog {
    products: Mutex<HashMap<ProductId, CatalogProduct>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-filled with `products`.
    pub fn with_products(products: impl IntoIterator<Item = CatalogProduct>) -> Self {
        Self {
            products: Mutex::new(products.into_iter().map(|p| (p.id, p)).collect()),
        }
    }

    pub async fn upsert(&self, product: CatalogProduct) {
        self.products.lock().await.insert(product.id, product);
    }

    pub async fn set_price(&self, id: ProductId, price: Money) {
        if let Some(product) = self.products.lock().await.get_mut(&id) {
            product.unit_price = price;
        }
    }

    pub async fn stock_of(&self, id: ProductId) -> Option<u32> {
        self.products
            .lock()
            .await
            .get(&id)
            .map(|p| p.units_in_stock)
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<CatalogProduct>, DomainError> {
        let products = self.products.lock().await;
        Ok(ids.iter().filter_map(|id| products.get(id).cloned()).collect())
    }
}

#[async_trait]
impl StockReservations for InMemoryCatalog {
    async fn reserve(&self, lines: &[StockLine]) -> Result<(), CheckoutError> {
        let mut products = self.products.lock().await;

        for line in lines {
            let product = products
                .get(&line.product_id)
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;
            if product.units_in_stock < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: product.units_in_stock,
                });
            }
        }

        for line in lines {
            if let Some(product) = products.get_mut(&line.product_id) {
                product.units_in_stock -= line.quantity;
            }
        }
        Ok(())
    }

    async fn release(&self, lines: &[StockLine]) -> Result<(), DomainError> {
        let mut products = self.products.lock().await;
        for line in lines {
            if let Some(product) = products.get_mut(&line.product_id) {
                product.units_in_stock = product.units_in_stock.saturating_add(line.quantity);
            }
        }
        Ok(())
    }
}
