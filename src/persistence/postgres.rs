use async_trait::async_trait;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;

use super::rows::{to_rows, OrderItemRow, OrderRow};
use super::{OrderRepository, RepositoryError};
use crate::domain::order::Order;

// ============================================================================
// PostgreSQL Order Repository
// ============================================================================
//
// Tables:
// - orders       (key: order_id)
// - order_items  (surrogate id, order_id -> orders, position keeps item order)
//
// `save` is one transaction: upsert the order row, replace its items.
// created_at / created_by are only written by the first insert.
//
// ============================================================================

const SCHEMA: [&str; 3] = [
    "CREATE TABLE IF NOT EXISTS orders (
        order_id TEXT PRIMARY KEY,
        customer_id TEXT NOT NULL,
        total_amount NUMERIC(19, 2) NOT NULL DEFAULT 0,
        status TEXT NOT NULL,
        payment_id TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        created_by TEXT,
        last_modified_by TEXT,
        trace_id TEXT,
        span_id TEXT,
        version BIGINT NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS order_items (
        id BIGSERIAL PRIMARY KEY,
        order_id TEXT NOT NULL REFERENCES orders (order_id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        product_id TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        unit_price NUMERIC(19, 2) NOT NULL,
        subtotal NUMERIC(19, 2) NOT NULL,
        product_name TEXT,
        product_category TEXT
    )",
    "CREATE INDEX IF NOT EXISTS order_items_order_id_idx ON order_items (order_id, position)",
];

const UPSERT_ORDER: &str = "INSERT INTO orders (
        order_id, customer_id, total_amount, status, payment_id, created_at, updated_at,
        created_by, last_modified_by, trace_id, span_id, version
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
    ON CONFLICT (order_id) DO UPDATE SET
        customer_id = EXCLUDED.customer_id,
        total_amount = EXCLUDED.total_amount,
        status = EXCLUDED.status,
        payment_id = EXCLUDED.payment_id,
        updated_at = EXCLUDED.updated_at,
        last_modified_by = EXCLUDED.last_modified_by,
        trace_id = EXCLUDED.trace_id,
        span_id = EXCLUDED.span_id,
        version = EXCLUDED.version";

const INSERT_ITEM: &str = "INSERT INTO order_items (
        order_id, position, product_id, quantity, unit_price, subtotal, product_name, product_category
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

const SELECT_ORDER: &str = "SELECT order_id, customer_id, total_amount, status, payment_id,
        created_at, updated_at, created_by, last_modified_by, trace_id, span_id, version
    FROM orders WHERE order_id = $1";

const SELECT_ITEMS: &str = "SELECT order_id, position, product_id, quantity, unit_price, subtotal,
        product_name, product_category
    FROM order_items WHERE order_id = $1 ORDER BY position ASC";

pub struct PostgresOrderRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Create `orders` and `order_items` if they do not exist yet.
    pub async fn init_schema(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Order schema ready");
        Ok(())
    }

    // Dropping the future on timeout rolls back any open transaction.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, RepositoryError>>,
    ) -> Result<T, RepositoryError> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| RepositoryError::Timeout)?
    }

    async fn write(&self, order: &Order) -> Result<(), RepositoryError> {
        let (row, items) = to_rows(order)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(UPSERT_ORDER)
            .bind(&row.order_id)
            .bind(&row.customer_id)
            .bind(row.total_amount)
            .bind(&row.status)
            .bind(&row.payment_id)
            .bind(row.created_at)
            .bind(row.updated_at)
            .bind(&row.created_by)
            .bind(&row.last_modified_by)
            .bind(&row.trace_id)
            .bind(&row.span_id)
            .bind(row.version)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(&row.order_id)
            .execute(&mut *tx)
            .await?;

        for item in &items {
            sqlx::query(INSERT_ITEM)
                .bind(&item.order_id)
                .bind(item.position)
                .bind(&item.product_id)
                .bind(item.quantity)
                .bind(item.unit_price)
                .bind(item.subtotal)
                .bind(&item.product_name)
                .bind(&item.product_category)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn read(&self, order_id: &str) -> Result<Option<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<OrderRow> = sqlx::query_as(SELECT_ORDER)
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items: Vec<OrderItemRow> = sqlx::query_as(SELECT_ITEMS)
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;
        row.into_order(items).map(Some)
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn save(&self, order: &Order) -> Result<(), RepositoryError> {
        self.bounded(self.write(order)).await?;

        tracing::debug!(
            order_id = %order.order_id,
            status = %order.status,
            version = order.version,
            item_count = order.items.len(),
            "Persisted order"
        );
        Ok(())
    }

    async fn find_by_id(&self, order_id: &str) -> Result<Option<Order>, RepositoryError> {
        self.bounded(self.read(order_id)).await
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.bounded(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }
}
