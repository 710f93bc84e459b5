//! # tally-db: Database Layer for the Tally Back Office
//!
//! SQLite storage through sqlx, the repositories on top of it, and the
//! services whose rules span several tables.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                                  │
//! │                                                                         │
//! │  HTTP handler (POST /api/checkout)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐  ┌───────────────┐  ┌──────────────────┐  │   │
//! │  │   │   Database    │  │  Repositories │  │    Services      │  │   │
//! │  │   │   (pool.rs)   │  │ products,     │  │ CartStore        │  │   │
//! │  │   │               │◄─│ orders, roles │◄─│ CheckoutService  │  │   │
//! │  │   │ SqlitePool    │  │ users, ...    │  │ Authorizer       │  │   │
//! │  │   └───────────────┘  └───────────────┘  └──────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          SQLite Database (WAL, migrations/sqlite)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`password`] - Argon2 password hashing
//! - [`error`] - Database and service error types
//! - [`repository`] - Per-table repositories
//! - [`service`] - Cart store, checkout committer, permission evaluator
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/tally.db")).await?;
//!
//! db.cart_store().add_line(user_id, &input).await?;
//! let order = db.checkout().commit(user_id, &request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod password;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ErrorKind, ServiceError, ServiceResult};
pub use pool::{Database, DbConfig};

// Repository and service re-exports for convenience
pub use repository::{
    CartRepository, CustomerRepository, NewOrder, NewUser, OrderRepository, ProductRepository,
    ReportRepository, RoleRepository, UserCredentials, UserRepository,
};
pub use service::{Authorizer, CartStore, CheckoutService};
