use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use domain::{Customer, LineItem, Money, NewOrder, Order, OrderStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderId, OrderQuery, OrderStoreError, PaymentReference, Result, store::OrderStore,
};

/// Name of the unique constraint on `orders.payment_reference`.
const UNIQUE_PAYMENT_REFERENCE: &str = "unique_payment_reference";

const ORDER_COLUMNS: &str = "id, payment_reference, customer_name, customer_email, \
     customer_address, customer_city, customer_postal_code, customer_country, \
     items, total_cents, status, created_at, updated_at";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_order(row: PgRow) -> Result<Order> {
        let items_json: serde_json::Value = row.try_get("items")?;
        let items: Vec<LineItem> = serde_json::from_value(items_json)?;
        let status: String = row.try_get("status")?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            payment_reference: PaymentReference::new(
                row.try_get::<String, _>("payment_reference")?,
            ),
            customer: Customer {
                name: row.try_get("customer_name")?,
                email: row.try_get("customer_email")?,
                address: row.try_get("customer_address")?,
                city: row.try_get("customer_city")?,
                postal_code: row.try_get("customer_postal_code")?,
                country: row.try_get("customer_country")?,
            },
            items,
            total: Money::from_cents(row.try_get("total_cents")?),
            status: OrderStatus::from_str(&status)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order> {
        let items_json = serde_json::to_value(&order.items)?;
        let order = order.into_order();

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, payment_reference, customer_name, customer_email, customer_address,
                customer_city, customer_postal_code, customer_country, items, total_cents,
                status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.payment_reference.as_str())
        .bind(&order.customer.name)
        .bind(&order.customer.email)
        .bind(&order.customer.address)
        .bind(&order.customer.city)
        .bind(&order.customer.postal_code)
        .bind(&order.customer.country)
        .bind(items_json)
        .bind(order.total.cents())
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some(UNIQUE_PAYMENT_REFERENCE)
            {
                return OrderStoreError::DuplicatePaymentReference(
                    order.payment_reference.clone(),
                );
            }
            OrderStoreError::Database(e)
        })?;

        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn find_by_payment_reference(
        &self,
        payment_reference: &PaymentReference,
    ) -> Result<Option<Order>> {
        let row: Option<PgRow> = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE payment_reference = $1"
        ))
        .bind(payment_reference.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_order).transpose()
    }

    async fn query(&self, query: OrderQuery) -> Result<Vec<Order>> {
        let mut sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1=1");
        let mut param_count = 0;
        let status_names = query.status_names();

        // Build dynamic query
        if query.customer_email.is_some() {
            param_count += 1;
            sql.push_str(&format!(
                " AND lower(btrim(customer_email)) = lower(${param_count})"
            ));
        }
        if status_names.is_some() {
            param_count += 1;
            sql.push_str(&format!(" AND lower(status) = ANY(${param_count})"));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        if query.limit.is_some() {
            param_count += 1;
            sql.push_str(&format!(" LIMIT ${param_count}"));
        }
        if query.offset.is_some() {
            param_count += 1;
            sql.push_str(&format!(" OFFSET ${param_count}"));
        }

        let mut sqlx_query = sqlx::query(&sql);

        if let Some(email) = query.customer_email {
            sqlx_query = sqlx_query.bind(email.trim().to_string());
        }
        if let Some(names) = status_names {
            sqlx_query = sqlx_query.bind(names);
        }
        if let Some(limit) = query.limit {
            sqlx_query = sqlx_query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }
        if let Some(offset) = query.offset {
            sqlx_query = sqlx_query.bind(i64::try_from(offset).unwrap_or(i64::MAX));
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_order).collect()
    }

    async fn update_status(&self, id: OrderId, status: OrderStatus) -> Result<Order> {
        let mut tx = self.pool.begin().await?;

        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
                .bind(id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;

        let current = current.ok_or(OrderStoreError::OrderNotFound(id))?;
        let next = OrderStatus::from_str(&current)?.transition_to(status)?;

        let row = sqlx::query(&format!(
            "UPDATE orders SET status = $2, updated_at = $3 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(next.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Self::row_to_order(row)
    }
}
