//! # HTTP Routes
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  public         /health  /api/register  /api/login                      │
//! │                                                                         │
//! │  signed in      /api/user  /api/logout  /api/users/{info,password}      │
//! │  (authenticate) /api/permissions                                        │
//! │                                                                         │
//! │  gated          users        /api/users[/{id}]                          │
//! │  (authenticate  roles        /api/roles[/{id}]                          │
//! │   + require_    customers    /api/customers[/{id}]                      │
//! │   permission)   products     /api/products[/{id}]                       │
//! │                 transactions /api/transactions/*  /api/orders[/{id}]    │
//! │                              /api/dropdown/customers                    │
//! │                 reports      /api/reports/*                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod customers;
pub mod products;
pub mod reports;
pub mod roles;
pub mod transactions;
pub mod users;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::middleware::{authenticate, require_permission, Gate};
use crate::state::AppState;

/// `?page=N`, 1-based. Missing or 0 means the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    let gated = Router::new()
        .merge(gate(&state, "users", users::routes()))
        .merge(gate(&state, "roles", roles::routes()))
        .merge(gate(&state, "customers", customers::routes()))
        .merge(gate(&state, "transactions", customers::dropdown_routes()))
        .merge(gate(&state, "products", products::routes()))
        .merge(gate(&state, "transactions", transactions::routes()))
        .merge(gate(&state, "reports", reports::routes()));

    let signed_in = Router::new()
        .route("/api/user", get(auth::current_user))
        .route("/api/logout", post(auth::logout))
        .route("/api/users/info", put(auth::update_info))
        .route("/api/users/password", put(auth::update_password))
        .route("/api/permissions", get(roles::list_permissions))
        .merge(gated)
        .route_layer(from_fn_with_state(state.clone(), authenticate));

    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .merge(signed_in)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Puts a route group behind `require_permission(resource)`.
fn gate(state: &AppState, resource: &'static str, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(from_fn_with_state(
        Gate {
            state: state.clone(),
            resource,
        },
        require_permission,
    ))
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}
