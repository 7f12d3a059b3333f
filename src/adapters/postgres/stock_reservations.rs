//! PostgreSQL implementation of StockReservations.
//!
//! Reserving decrements `product.units_in_stock` with a guarded UPDATE per
//! line inside one transaction. Lines are processed in product-id order so
//! concurrent checkouts lock rows in the same order.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::checkout::CheckoutError;
use crate::domain::foundation::DomainError;
use crate::ports::{StockLine, StockReservations};

pub struct PostgresStockReservations {
    pool: PgPool,
}

impl PostgresStockReservations {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn sorted(lines: &[StockLine]) -> Vec<StockLine> {
    let mut lines = lines.to_vec();
    lines.sort_by_key(|line| line.product_id);
    lines
}

fn quantity(line: &StockLine) -> Result<i32, CheckoutError> {
    i32::try_from(line.quantity).map_err(|_| CheckoutError::InsufficientStock {
        product_id: line.product_id,
        requested: line.quantity,
        available: 0,
    })
}

#[async_trait]
impl StockReservations for PostgresStockReservations {
    async fn reserve(&self, lines: &[StockLine]) -> Result<(), CheckoutError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            CheckoutError::infrastructure(format!("Failed to start transaction: {}", e))
        })?;

        for line in sorted(lines) {
            let reserved: Option<(i32,)> = sqlx::query_as(
                r#"
                UPDATE product
                SET units_in_stock = units_in_stock - $2, last_updated = now()
                WHERE id = $1 AND units_in_stock >= $2
                RETURNING units_in_stock
                "#,
            )
            .bind(line.product_id.value())
            .bind(quantity(&line)?)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| CheckoutError::infrastructure(format!("Failed to reserve stock: {}", e)))?;

            if reserved.is_some() {
                continue;
            }

            let current: Option<(i32,)> =
                sqlx::query_as("SELECT units_in_stock FROM product WHERE id = $1")
                    .bind(line.product_id.value())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|e| {
                        CheckoutError::infrastructure(format!("Failed to read stock: {}", e))
                    })?;

            // Dropping the transaction rolls back earlier lines.
            return Err(match current {
                None => CheckoutError::ProductNotFound(line.product_id),
                Some((available,)) => CheckoutError::InsufficientStock {
                    product_id: line.product_id,
                    requested: line.quantity,
                    available: u32::try_from(available).unwrap_or(0),
                },
            });
        }

        tx.commit().await.map_err(|e| {
            CheckoutError::infrastructure(format!("Failed to commit reservation: {}", e))
        })?;
        Ok(())
    }

    async fn release(&self, lines: &[StockLine]) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to start transaction: {}", e)))?;

        for line in sorted(lines) {
            sqlx::query(
                r#"
                UPDATE product
                SET units_in_stock = units_in_stock + $2, last_updated = now()
                WHERE id = $1
                "#,
            )
            .bind(line.product_id.value())
            .bind(i64::from(line.quantity))
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database(format!("Failed to release stock: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit release: {}", e)))?;
        Ok(())
    }
}
