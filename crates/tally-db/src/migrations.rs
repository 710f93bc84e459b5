//! # Schema Migrations
//!
//! SQL files under `migrations/sqlite/` are compiled into the binary and
//! applied in filename order when the pool opens.
//!
//! ```text
//! 001_initial_schema.sql
//!   users ─► roles ◄─ role_permissions ─► permissions (12 seeded)
//!   customers   products   cart_lines
//!   orders ◄─ order_lines ◄─ profits
//!   seeded roles: 1 Admin (all), 2 Cashier (view products/customers,
//!                 view + edit transactions)
//! ```
//!
//! Applied files are checksummed in `_sqlx_migrations`. Schema changes go in
//! a new numbered file; editing an applied one breaks the checksum on every
//! existing shop database.

use sqlx::migrate::Migrator;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

static MIGRATOR: Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever the database hasn't seen yet. Each file runs in its own
/// transaction.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let (embedded, applied) = migration_status(pool).await?;
    if embedded == applied {
        info!(applied, "Schema is current");
        return Ok(());
    }

    info!(pending = embedded.saturating_sub(applied), "Applying migrations");
    MIGRATOR.run(pool).await?;
    info!(embedded, "Migrations applied");
    Ok(())
}

/// `(embedded, applied)`. A fresh database reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.iter().count();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((embedded, applied.max(0) as usize))
}
