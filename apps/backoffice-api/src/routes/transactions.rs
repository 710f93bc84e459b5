//! The register: barcode lookup, cart, checkout and order history.
//! Guarded by `transactions`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tally_core::input::{AddCartLineInput, CheckoutRequest};
use tally_core::{normalize_page, Cart, CartLine, Order, Page, Product};
use tracing::info;

use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::middleware::Principal;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/transactions/search-product", get(search_product))
        .route("/api/transactions/cart", get(show_cart).post(add_to_cart))
        .route("/api/transactions/cart/{id}", delete(remove_from_cart))
        .route("/api/transactions/checkout", post(checkout))
        .route("/api/orders", get(list_orders))
        .route("/api/orders/{id}", get(show_order))
}

#[derive(Debug, Deserialize)]
struct BarcodeQuery {
    #[serde(default)]
    barcode: String,
}

async fn search_product(
    State(state): State<AppState>,
    Query(q): Query<BarcodeQuery>,
) -> ApiResult<Json<Product>> {
    if q.barcode.trim().is_empty() {
        return Err(ApiError::validation("barcode is required"));
    }
    Ok(Json(state.db.cart_store().find_product_by_barcode(&q.barcode).await?))
}

async fn show_cart(
    State(state): State<AppState>,
    Principal(user_id): Principal,
) -> ApiResult<Json<Cart>> {
    Ok(Json(state.db.cart_store().get_cart(user_id).await?))
}

async fn add_to_cart(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(input): Json<AddCartLineInput>,
) -> ApiResult<(StatusCode, Json<CartLine>)> {
    let line = state.db.cart_store().add_line(user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.db.cart_store().remove_line(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn checkout(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = state.db.checkout().commit(user_id, &request).await?;
    info!(
        user_id,
        order_id = order.id,
        invoice = order.invoice.as_deref().unwrap_or_default(),
        "Checkout completed"
    );
    Ok((StatusCode::CREATED, Json(order)))
}

async fn list_orders(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<Page<Order>>> {
    Ok(Json(state.db.orders().list_paged(normalize_page(q.page)).await?))
}

async fn show_order(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Order>> {
    let order = state
        .db
        .orders()
        .get_with_lines(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Order not found: {id}")))?;
    Ok(Json(order))
}
