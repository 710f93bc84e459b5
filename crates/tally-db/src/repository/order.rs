//! # Order Repository
//!
//! Committed orders. The write helpers take a connection and run only inside
//! the [`crate::service::CheckoutService`] transaction; once committed an
//! order never changes.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use tally_core::{
    page_offset, Money, Order, OrderLine, Page, PageMeta, ProfitEntry, Quantity, PAGE_SIZE,
};

const ORDER_COLUMNS: &str =
    "id, user_id, customer_id, invoice, cash, change, discount, grand_total, created_at";

/// Header row of an order about to be committed. The invoice is assigned
/// afterwards, once the id is known.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub customer_id: Option<i64>,
    pub cash: Money,
    pub change: Money,
    pub discount: Money,
    pub grand_total: Money,
    pub created_at: DateTime<Utc>,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its lines.
    ///
    /// ## Returns
    /// * `Ok(Some(Order))` - Order with `lines` filled in id order
    /// * `Ok(None)` - No such order
    pub async fn get_with_lines(&self, id: i64) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut order) = order else {
            return Ok(None);
        };

        order.lines = self.lines(id).await?;
        Ok(Some(order))
    }

    /// Lines of one order joined with the product title.
    pub async fn lines(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT l.id, l.order_id, l.product_id, p.title AS product_title, l.qty, l.price
            FROM order_lines l
            INNER JOIN products p ON p.id = l.product_id
            WHERE l.order_id = ?1
            ORDER BY l.id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lists one page of orders, newest first, each with its lines.
    pub async fn list_paged(&self, page: u32) -> DbResult<Page<Order>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let mut data = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY id DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(PAGE_SIZE as i64)
        .bind(page_offset(page))
        .fetch_all(&self.pool)
        .await?;

        for order in &mut data {
            order.lines = self.lines(order.id).await?;
        }

        Ok(Page {
            data,
            meta: PageMeta::new(total, page),
        })
    }

    /// Profit entries recorded for one order.
    pub async fn profits(&self, order_id: i64) -> DbResult<Vec<ProfitEntry>> {
        let entries = sqlx::query_as::<_, ProfitEntry>(
            r#"
            SELECT id, order_id, order_line_id, total, created_at
            FROM profits
            WHERE order_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    // =========================================================================
    // Checkout transaction
    // =========================================================================

    /// Inserts the order header with no invoice. Returns `(id, created_at)`.
    pub async fn insert_order(
        conn: &mut SqliteConnection,
        order: &NewOrder,
    ) -> DbResult<(i64, DateTime<Utc>)> {
        let row: (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO orders (
                user_id, customer_id, invoice, cash, change, discount, grand_total, created_at
            ) VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6, ?7)
            RETURNING id, created_at
            "#,
        )
        .bind(order.user_id)
        .bind(order.customer_id)
        .bind(order.cash)
        .bind(order.change)
        .bind(order.discount)
        .bind(order.grand_total)
        .bind(order.created_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Inserts one order line and returns its id.
    pub async fn insert_line(
        conn: &mut SqliteConnection,
        order_id: i64,
        product_id: i64,
        qty: Quantity,
        price: Money,
    ) -> DbResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_lines (order_id, product_id, qty, price)
            VALUES (?1, ?2, ?3, ?4)
            RETURNING id
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .bind(qty)
        .bind(price)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    pub async fn insert_profit(
        conn: &mut SqliteConnection,
        order_id: i64,
        order_line_id: i64,
        total: Money,
        created_at: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profits (order_id, order_line_id, total, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(order_id)
        .bind(order_line_id)
        .bind(total)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Sets the invoice code. Only ever applies once per order.
    pub async fn assign_invoice(conn: &mut SqliteConnection, order_id: i64, invoice: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE orders SET invoice = ?2 WHERE id = ?1 AND invoice IS NULL")
            .bind(order_id)
            .bind(invoice)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
