//! # Repository Module
//!
//! Database repository implementations for the back office.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list_paged(page)                                │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── list_paged(&self, page)                                           │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, input, image)                                       │
//! │  └── update(&self, id, input)                                          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Multi-step rules (cart ownership, checkout, authorization) sit one    │
//! │  level up in `crate::service`.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Catalog CRUD and barcode lookup
//! - [`CartRepository`] - Raw cart line rows
//! - [`OrderRepository`] - Committed orders, lines and profit entries
//! - [`RoleRepository`] - Roles, permissions and their association
//! - [`UserRepository`] - Staff accounts and credentials
//! - [`CustomerRepository`] - Customers
//! - [`ReportRepository`] - Date-range sales and profit reports

use sqlx::SqliteConnection;

use crate::error::DbError;

pub mod cart;
pub mod customer;
pub mod order;
pub mod product;
pub mod report;
pub mod role;
pub mod user;

pub use cart::CartRepository;
pub use customer::CustomerRepository;
pub use order::{NewOrder, OrderRepository};
pub use product::ProductRepository;
pub use report::ReportRepository;
pub use role::RoleRepository;
pub use user::{NewUser, UserCredentials, UserRepository};

/// Explains a guarded `DELETE … AND NOT EXISTS (…)` that touched nothing:
/// either the row is gone or something still points at it.
pub(crate) async fn blocked_delete(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &'static str,
    id: i64,
    referenced_by: &'static str,
) -> DbError {
    let found = sqlx::query_scalar::<_, i64>(&format!("SELECT id FROM {table} WHERE id = ?1"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await;

    match found {
        Ok(Some(_)) => DbError::ForeignKeyViolation {
            detail: format!("{entity} {id} is still referenced by {referenced_by}"),
        },
        Ok(None) => DbError::not_found(entity, id),
        Err(err) => err.into(),
    }
}
