//! # Tally Back Office API
//!
//! JSON HTTP server for the back office: catalog, customers, staff, roles,
//! the register (cart and checkout) and reports.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Back Office API                                   │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  routes        │  │  middleware    │  │  tally-db                  ││
//! │  │                │  │                │  │                            ││
//! │  │ • auth         │  │ • authenticate │  │ • repositories             ││
//! │  │ • users/roles  │─►│   (jwt cookie) │─►│ • CartStore                ││
//! │  │ • products     │  │ • require_     │  │ • CheckoutService          ││
//! │  │ • transactions │  │   permission   │  │ • Authorizer               ││
//! │  │ • reports      │  │                │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Collaborators (traits)                       │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │ TokenService │  │ ObjectStore  │  │ ReportRenderer           ││  │
//! │  │  │ JwtManager   │  │ LocalObject- │  │ DelimitedRenderer (csv)  ││  │
//! │  │  │              │  │ Store        │  │                          ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `HTTP_PORT` - HTTP server port (default: 8000)
//! - `DATABASE_PATH` - SQLite file (default: ./data/tally.db)
//! - `DB_MAX_CONNECTIONS` - Pool size (default: 5)
//! - `JWT_SECRET` - Secret for JWT signing
//! - `JWT_LIFETIME_SECS` - Session lifetime (default: 86400)
//! - `STORAGE_DIR` - Product image directory (default: ./data/uploads)
//! - `DEFAULT_ROLE_ID` - Role for self-registered users (default: 2)
//! - `COOKIE_SECURE` - Mark the session cookie `Secure` (default: false)

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod reports;
pub mod routes;
pub mod state;
pub mod storage;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::router;
pub use state::AppState;
