//! # Database Handle
//!
//! Opens the shop's SQLite file and hands out repositories and services that
//! share one pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DbConfig::new("./data/tally.db")          DbConfig::in_memory()        │
//! │       │  WAL, foreign_keys, busy_timeout        │  one connection        │
//! │       └──────────────┬──────────────────────────┘                       │
//! │                      ▼                                                  │
//! │             Database::new ── migrations ── SqlitePool                   │
//! │                      │                                                  │
//! │     ┌────────────────┼─────────────────────┬──────────────────┐         │
//! │     ▼                ▼                     ▼                  ▼         │
//! │  products()      cart_store()          checkout()        authorizer()   │
//! │  customers() ... (CartStore)      (CheckoutService)      (Authorizer)   │
//! │                                                                         │
//! │  Readers share the WAL snapshot. Checkouts queue on the single write    │
//! │  lock for up to busy_timeout before SQLITE_BUSY surfaces.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::{
    CartRepository, CustomerRepository, OrderRepository, ProductRepository, ReportRepository,
    RoleRepository, UserRepository,
};
use crate::service::{Authorizer, CartStore, CheckoutService};

const MEMORY_PATH: &str = ":memory:";

// =============================================================================
// Configuration
// =============================================================================

/// Pool settings. Build with [`DbConfig::new`] or [`DbConfig::in_memory`] and
/// adjust with the chained setters.
///
/// ```rust,ignore
/// let config = DbConfig::new("./data/tally.db").max_connections(8);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub database_path: PathBuf,
    /// Default 5. In-memory databases are pinned to 1.
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long `acquire` may wait for a free connection.
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    /// How long a writer waits on another writer's lock.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    /// File-backed database; the file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Private database for one test. Every connection to `:memory:` would
    /// see its own empty database, so the pool holds exactly one.
    pub fn in_memory() -> Self {
        DbConfig {
            max_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            ..DbConfig::new(MEMORY_PATH)
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let url = format!("sqlite://{}?mode=rwc", self.database_path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // off by default in SQLite; cart and order rows depend on it
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
            .create_if_missing(true);

        Ok(options)
    }
}

// =============================================================================
// Database
// =============================================================================

/// Cloneable handle over the pool. Repositories and services are created on
/// demand and each holds its own clone of the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and, unless disabled, applies pending migrations.
    ///
    /// ## Returns
    /// * `Ok(Database)` - Pool is open and the schema is current
    /// * `Err(DbError::ConnectionFailed)` - Bad path or the file can't be opened
    /// * `Err(DbError::MigrationFailed)` - A migration didn't apply
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening database");

        let options = config.connect_options()?;
        debug!(busy_timeout_ms = config.busy_timeout.as_millis() as u64, "Connect options ready");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(max_connections = config.max_connections, "Database pool open");

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Applies pending migrations. Already applied ones are skipped.
    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    /// Raw pool, for transactions that span repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Repositories
    // -------------------------------------------------------------------------

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn carts(&self) -> CartRepository {
        CartRepository::new(self.pool.clone())
    }

    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    pub fn roles(&self) -> RoleRepository {
        RoleRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.pool.clone())
    }

    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Services
    // -------------------------------------------------------------------------

    /// Per-user cart: add, remove, view, barcode lookup.
    pub fn cart_store(&self) -> CartStore {
        CartStore::new(self.pool.clone())
    }

    /// Cart to order in one transaction.
    pub fn checkout(&self) -> CheckoutService {
        CheckoutService::new(self.pool.clone())
    }

    /// Verb and resource gate, evaluated against the role's current grants.
    pub fn authorizer(&self) -> Authorizer {
        Authorizer::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// `SELECT 1` against the pool. Backs `GET /health`.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// `(embedded, applied)` migration counts.
    pub async fn migration_status(&self) -> DbResult<(usize, usize)> {
        migrations::migration_status(&self.pool).await
    }
}
