//! PostgreSQL implementation of ProductCatalog.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Money, ProductId};
use crate::ports::{CatalogProduct, ProductCatalog};

pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    unit_price: Decimal,
    active: bool,
    units_in_stock: i32,
}

impl TryFrom<ProductRow> for CatalogProduct {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let invalid = |e: String| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid product {}: {}", row.id, e),
            )
        };
        Ok(CatalogProduct {
            id: ProductId::new(row.id).map_err(|e| invalid(e.to_string()))?,
            unit_price: Money::from_decimal(row.unit_price).map_err(|e| invalid(e.to_string()))?,
            units_in_stock: u32::try_from(row.units_in_stock).map_err(|e| invalid(e.to_string()))?,
            name: row.name,
            active: row.active,
        })
    }
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<CatalogProduct>, DomainError> {
        let keys: Vec<i64> = ids.iter().map(ProductId::value).collect();
        let rows: Vec<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, name, unit_price, active, units_in_stock
            FROM product
            WHERE id = ANY($1)
            "#,
        )
        .bind(&keys)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to load products: {}", e)))?;

        rows.into_iter().map(CatalogProduct::try_from).collect()
    }
}
