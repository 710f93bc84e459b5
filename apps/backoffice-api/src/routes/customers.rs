//! Customer records. Guarded by `customers`; the checkout picker is
//! guarded by `transactions` instead so cashiers can use it.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tally_core::input::CustomerInput;
use tally_core::{normalize_page, Customer, Page};

use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/customers", get(list).post(create))
        .route("/api/customers/{id}", get(show).put(update).delete(remove))
}

pub fn dropdown_routes() -> Router<AppState> {
    Router::new().route("/api/dropdown/customers", get(dropdown))
}

async fn list(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<Page<Customer>>> {
    Ok(Json(state.db.customers().list_paged(normalize_page(q.page)).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    let input = input.validate()?;
    let customer = state.db.customers().create(&input).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Customer>> {
    let customer = state
        .db
        .customers()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer not found: {id}")))?;
    Ok(Json(customer))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<CustomerInput>,
) -> ApiResult<Json<Customer>> {
    let input = input.validate()?;
    Ok(Json(state.db.customers().update(id, &input).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.customers().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn dropdown(State(state): State<AppState>) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.db.customers().list_all().await?))
}
