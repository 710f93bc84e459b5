//! # Cart Repository
//!
//! Raw access to `cart_lines`. Ownership and product checks live in
//! [`crate::service::CartStore`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{CartItem, CartLine, Money, Quantity};

/// Repository for cart line rows.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Inserts a line with a frozen unit price.
    pub async fn insert(
        &self,
        user_id: i64,
        product_id: i64,
        qty: Quantity,
        price: Money,
    ) -> DbResult<CartLine> {
        debug!(user_id, product_id, qty = %qty, "Inserting cart line");

        let line = sqlx::query_as::<_, CartLine>(
            r#"
            INSERT INTO cart_lines (user_id, product_id, qty, price, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id, user_id, product_id, qty, price, created_at
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(qty)
        .bind(price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    pub async fn get(&self, id: i64) -> DbResult<Option<CartLine>> {
        let line = sqlx::query_as::<_, CartLine>(
            "SELECT id, user_id, product_id, qty, price, created_at FROM cart_lines WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(line)
    }

    /// Lines of one user in insertion order.
    pub async fn lines_for_user(&self, user_id: i64) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, user_id, product_id, qty, price, created_at
            FROM cart_lines
            WHERE user_id = ?1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Lines of one user joined with product title and barcode.
    pub async fn items_for_user(&self, user_id: i64) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT c.id, c.product_id, p.title, p.barcode, c.qty, c.price
            FROM cart_lines c
            INNER JOIN products p ON p.id = c.product_id
            WHERE c.user_id = ?1
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Deletes one line. Returns whether a row was removed.
    pub async fn delete(&self, id: i64) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM cart_lines WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Checkout transaction
    // =========================================================================

    /// Deletes and returns every line of a user, in id order.
    ///
    /// Run as the first statement of a transaction it takes the SQLite write
    /// lock, so a concurrent claim of the same cart waits and then finds
    /// nothing.
    pub async fn claim_for_user(conn: &mut SqliteConnection, user_id: i64) -> DbResult<Vec<CartLine>> {
        let mut lines = sqlx::query_as::<_, CartLine>(
            r#"
            DELETE FROM cart_lines
            WHERE user_id = ?1
            RETURNING id, user_id, product_id, qty, price, created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        // RETURNING order is unspecified
        lines.sort_by_key(|line| line.id);
        Ok(lines)
    }
}
