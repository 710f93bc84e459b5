//! # Report Repository
//!
//! Sales and profit reports over an inclusive date range.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  start_date = 2026-10-01, end_date = 2026-10-31                         │
//! │                                                                         │
//! │  WHERE DATE(created_at) BETWEEN '2026-10-01' AND '2026-10-31'           │
//! │                                                                         │
//! │  sales   → one row per order,        total = Σ grand_total             │
//! │  profits → one row per profit entry, total = Σ total                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dates are compared on the UTC calendar day the row was written.

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use tally_core::{Money, ProfitRow, Report, SalesRow};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Orders placed between `start` and `end`, both inclusive.
    pub async fn sales_between(&self, start: NaiveDate, end: NaiveDate) -> DbResult<Report<SalesRow>> {
        debug!(%start, %end, "Building sales report");

        let rows = sqlx::query_as::<_, SalesRow>(
            r#"
            SELECT
                o.id AS order_id,
                o.invoice,
                u.first_name || ' ' || u.last_name AS cashier,
                c.name AS customer,
                (SELECT COUNT(*) FROM order_lines l WHERE l.order_id = o.id) AS line_count,
                o.discount,
                o.grand_total,
                o.created_at
            FROM orders o
            INNER JOIN users u ON u.id = o.user_id
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE DATE(o.created_at) BETWEEN ?1 AND ?2
            ORDER BY o.id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(grand_total) FROM orders WHERE DATE(created_at) BETWEEN ?1 AND ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Report {
            rows,
            total: Money::from_cents(total.unwrap_or(0)),
        })
    }

    /// Profit entries recorded between `start` and `end`, both inclusive.
    pub async fn profits_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Report<ProfitRow>> {
        debug!(%start, %end, "Building profit report");

        let rows = sqlx::query_as::<_, ProfitRow>(
            r#"
            SELECT p.id, p.order_id, o.invoice, p.total, p.created_at
            FROM profits p
            INNER JOIN orders o ON o.id = p.order_id
            WHERE DATE(p.created_at) BETWEEN ?1 AND ?2
            ORDER BY p.id
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let total: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(total) FROM profits WHERE DATE(created_at) BETWEEN ?1 AND ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Report {
            rows,
            total: Money::from_cents(total.unwrap_or(0)),
        })
    }
}
