//! PostgreSQL implementation of OrderRepository.
//!
//! An order spans four tables (`customer`, `address`, `orders`,
//! `order_item`). `save` writes all of them in one transaction; reads join
//! them back into the aggregate.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::domain::checkout::{Address, Customer, Order, OrderItem, OrderStatus};
use crate::domain::foundation::{
    AddressId, CustomerId, DomainError, ErrorCode, Money, OrderId, OrderTrackingNumber, ProductId,
    Timestamp,
};
use crate::ports::{OrderRepository, UpdateResult};

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Names are snapshotted per order; the shared `customer` row only owns
/// the id and e-mail.
const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_tracking_number, o.total_quantity, o.total_price_cents, o.currency,
           o.status, o.payment_intent_id, o.last_payment_error, o.date_created, o.last_updated,
           c.id AS customer_id, o.customer_first_name AS first_name,
           o.customer_last_name AS last_name, c.email,
           s.id AS ship_id, s.street AS ship_street, s.city AS ship_city, s.state AS ship_state,
           s.country AS ship_country, s.zip_code AS ship_zip_code,
           b.id AS bill_id, b.street AS bill_street, b.city AS bill_city, b.state AS bill_state,
           b.country AS bill_country, b.zip_code AS bill_zip_code
    FROM orders o
    JOIN customer c ON c.id = o.customer_id
    JOIN address s ON s.id = o.shipping_address_id
    JOIN address b ON b.id = o.billing_address_id
"#;

// No-op update on conflict so RETURNING yields the existing id.
const UPSERT_CUSTOMER: &str = r#"
    INSERT INTO customer (id, first_name, last_name, email)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
    RETURNING id
"#;

// ════════════════════════════════════════════════════════════════════════════════
// Rows
// ════════════════════════════════════════════════════════════════════════════════

/// One `address` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddressRow {
    pub id: Uuid,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
}

impl AddressRow {
    /// Row for an address, assigning an id if it has none yet.
    pub fn from_address(address: &Address) -> Self {
        let id = address.id().unwrap_or_default();
        Self {
            id: *id.as_uuid(),
            street: address.street().to_string(),
            city: address.city().to_string(),
            state: address.state().to_string(),
            country: address.country().to_string(),
            zip_code: address.zip_code().to_string(),
        }
    }
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address::reconstitute(
            AddressId::from_uuid(row.id),
            row.street,
            row.city,
            row.state,
            row.country,
            row.zip_code,
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_tracking_number: String,
    total_quantity: i32,
    total_price_cents: i64,
    currency: String,
    status: String,
    payment_intent_id: Option<String>,
    last_payment_error: Option<String>,
    date_created: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    customer_id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    ship_id: Uuid,
    ship_street: String,
    ship_city: String,
    ship_state: String,
    ship_country: String,
    ship_zip_code: String,
    bill_id: Uuid,
    bill_street: String,
    bill_city: String,
    bill_state: String,
    bill_country: String,
    bill_zip_code: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderItemRow {
    order_id: Uuid,
    product_id: i64,
    image_url: String,
    unit_price_cents: i64,
    quantity: i32,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = DomainError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        let product_id = ProductId::new(row.product_id).map_err(corrupt)?;
        let unit_price = Money::from_cents(row.unit_price_cents).map_err(corrupt)?;
        let quantity = u32::try_from(row.quantity).map_err(corrupt)?;
        OrderItem::new(product_id, row.image_url, unit_price, quantity).map_err(corrupt)
    }
}

fn corrupt(e: impl std::fmt::Display) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Invalid stored order: {}", e))
}

fn db_error(context: &str) -> impl Fn(sqlx::Error) -> DomainError + '_ {
    move |e| DomainError::database(format!("{}: {}", context, e))
}

fn order_from_rows(row: OrderRow, item_rows: Vec<OrderItemRow>) -> Result<Order, DomainError> {
    let status = OrderStatus::parse(&row.status)
        .ok_or_else(|| corrupt(format!("unknown status {}", row.status)))?;
    let mut items = item_rows
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    items.sort_by_key(|item| item.product_id());

    let shipping_address = Address::from(AddressRow {
        id: row.ship_id,
        street: row.ship_street,
        city: row.ship_city,
        state: row.ship_state,
        country: row.ship_country,
        zip_code: row.ship_zip_code,
    });
    let billing_address = Address::from(AddressRow {
        id: row.bill_id,
        street: row.bill_street,
        city: row.bill_city,
        state: row.bill_state,
        country: row.bill_country,
        zip_code: row.bill_zip_code,
    });

    Ok(Order {
        id: OrderId::from_uuid(row.id),
        tracking_number: OrderTrackingNumber::parse(&row.order_tracking_number).map_err(corrupt)?,
        customer: Customer::reconstitute(
            CustomerId::from_uuid(row.customer_id),
            row.first_name,
            row.last_name,
            row.email,
        ),
        shipping_address,
        billing_address,
        items,
        total_quantity: u32::try_from(row.total_quantity).map_err(corrupt)?,
        total_price: Money::from_cents(row.total_price_cents).map_err(corrupt)?,
        currency: row.currency.trim().to_string(),
        status,
        payment_intent_id: row.payment_intent_id,
        last_payment_error: row.last_payment_error,
        created_at: Timestamp::from_datetime(row.date_created),
        updated_at: Timestamp::from_datetime(row.last_updated),
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Queries
// ════════════════════════════════════════════════════════════════════════════════

impl PostgresOrderRepository {
    /// Insert the customer keyed by e-mail unless one exists; returns the
    /// stored id.
    async fn upsert_customer(
        tx: &mut Transaction<'_, Postgres>,
        customer: &Customer,
    ) -> Result<Uuid, DomainError> {
        let candidate = customer.id().unwrap_or_default();
        let (id,): (Uuid,) = sqlx::query_as(UPSERT_CUSTOMER)
            .bind(candidate.as_uuid())
            .bind(customer.first_name())
            .bind(customer.last_name())
            .bind(customer.email())
            .fetch_one(&mut **tx)
            .await
            .map_err(db_error("Failed to upsert customer"))?;
        Ok(id)
    }

    async fn insert_address(
        tx: &mut Transaction<'_, Postgres>,
        address: &Address,
    ) -> Result<Uuid, DomainError> {
        let row = AddressRow::from_address(address);
        sqlx::query(
            r#"
            INSERT INTO address (id, street, city, state, country, zip_code)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(row.id)
        .bind(&row.street)
        .bind(&row.city)
        .bind(&row.state)
        .bind(&row.country)
        .bind(&row.zip_code)
        .execute(&mut **tx)
        .await
        .map_err(db_error("Failed to save address"))?;
        Ok(row.id)
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderItemRow>>, DomainError> {
        let rows: Vec<OrderItemRow> = sqlx::query_as(
            r#"
            SELECT order_id, product_id, image_url, unit_price_cents, quantity
            FROM order_item
            WHERE order_id = ANY($1)
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to load order items"))?;

        let mut grouped: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row);
        }
        Ok(grouped)
    }

    async fn assemble(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, DomainError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut items = self.load_items(&ids).await?;
        rows.into_iter()
            .map(|row| {
                let order_items = items.remove(&row.id).unwrap_or_default();
                order_from_rows(row, order_items)
            })
            .collect()
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<Order>, DomainError> {
        let sql = format!("{} WHERE o.{} = $1", ORDER_SELECT, column);
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find order"))?;

        match row {
            Some(row) => Ok(self.assemble(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to start transaction"))?;

        let customer_id = Self::upsert_customer(&mut tx, &order.customer).await?;
        let shipping_id = Self::insert_address(&mut tx, &order.shipping_address).await?;
        let billing_id = Self::insert_address(&mut tx, &order.billing_address).await?;

        let total_quantity = i32::try_from(order.total_quantity).map_err(corrupt)?;
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_tracking_number, customer_id, customer_first_name, customer_last_name,
                shipping_address_id, billing_address_id, total_quantity, total_price_cents,
                currency, status, payment_intent_id, last_payment_error, date_created,
                last_updated
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.tracking_number.as_str())
        .bind(customer_id)
        .bind(order.customer.first_name())
        .bind(order.customer.last_name())
        .bind(shipping_id)
        .bind(billing_id)
        .bind(total_quantity)
        .bind(order.total_price.cents())
        .bind(&order.currency)
        .bind(order.status.as_str())
        .bind(&order.payment_intent_id)
        .bind(&order.last_payment_error)
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => DomainError::new(
                ErrorCode::Conflict,
                format!("Order {} already exists", order.tracking_number),
            ),
            _ => DomainError::database(format!("Failed to save order: {}", e)),
        })?;

        for item in &order.items {
            let quantity = i32::try_from(item.quantity()).map_err(corrupt)?;
            sqlx::query(
                r#"
                INSERT INTO order_item (order_id, product_id, image_url, unit_price_cents, quantity)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(order.id.as_uuid())
            .bind(item.product_id().value())
            .bind(item.image_url())
            .bind(item.unit_price().cents())
            .bind(quantity)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to save order item"))?;
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        tracing::debug!(
            tracking_number = %order.tracking_number,
            items = order.items.len(),
            "Order persisted"
        );
        Ok(())
    }

    async fn update(
        &self,
        order: &Order,
        expected: OrderStatus,
    ) -> Result<UpdateResult, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = $2,
                payment_intent_id = $3,
                last_payment_error = $4,
                last_updated = $5
            WHERE id = $1 AND status = $6
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(&order.payment_intent_id)
        .bind(&order.last_payment_error)
        .bind(order.updated_at.as_datetime())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update order"))?;

        if result.rows_affected() == 1 {
            return Ok(UpdateResult::Updated);
        }

        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM orders WHERE id = $1)")
                .bind(order.id.as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("Failed to check order"))?;
        if !exists {
            return Err(DomainError::new(
                ErrorCode::OrderNotFound,
                order.tracking_number.to_string(),
            ));
        }
        Ok(UpdateResult::StatusChanged)
    }

    async fn find_by_tracking_number(
        &self,
        tracking_number: &OrderTrackingNumber,
    ) -> Result<Option<Order>, DomainError> {
        self.find_one("order_tracking_number", tracking_number.as_str())
            .await
    }

    async fn find_by_payment_intent_id(
        &self,
        intent_id: &str,
    ) -> Result<Option<Order>, DomainError> {
        self.find_one("payment_intent_id", intent_id).await
    }

    async fn list_by_customer_email(&self, email: &str) -> Result<Vec<Order>, DomainError> {
        let sql = format!("{} WHERE c.email = $1 ORDER BY o.date_created DESC", ORDER_SELECT);
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list orders"))?;
        self.assemble(rows).await
    }
}
