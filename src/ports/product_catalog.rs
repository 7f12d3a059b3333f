//! Read-only view of the product catalog.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Money, ProductId};

/// Current catalog state of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub active: bool,
    pub units_in_stock: u32,
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Products matching `ids`. Unknown ids are simply absent from the result.
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<CatalogProduct>, DomainError>;
}
