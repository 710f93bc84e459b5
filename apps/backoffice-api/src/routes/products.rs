//! Product management. Guarded by `products`.
//!
//! Create and update take `multipart/form-data` with the text fields
//! `title`, `description`, `barcode`, `price`, `sell_price` (cents), `stock`
//! and an optional `image` file.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tally_core::input::ProductInput;
use tally_core::{normalize_page, Money, Page, Product, Quantity, ValidationError};

use super::PageQuery;
use crate::catalog::ImageUpload;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/{id}", get(show).put(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> ApiResult<Json<Page<Product>>> {
    Ok(Json(state.db.products().list_paged(normalize_page(q.page)).await?))
}

async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Product>> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Product not found: {id}")))?;
    Ok(Json(product))
}

async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let (input, image) = read_form(multipart).await?;
    let product = state.catalog().create(input, image).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Json<Product>> {
    let (input, image) = read_form(multipart).await?;
    Ok(Json(state.catalog().update(id, input, image).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.catalog().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Form Parsing
// =============================================================================

#[derive(Debug, Default)]
struct ProductForm {
    title: Option<String>,
    description: Option<String>,
    barcode: Option<String>,
    price: Option<String>,
    sell_price: Option<String>,
    stock: Option<String>,
    image: Option<ImageUpload>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<(ProductInput, Option<ImageUpload>)> {
    let bad_form = |e: axum::extract::multipart::MultipartError| {
        ApiError::validation(format!("malformed form: {}", e))
    };

    let mut form = ProductForm::default();
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.map_err(bad_form)?;
            // browsers send an empty part when no file was picked
            if !bytes.is_empty() {
                form.image = Some(ImageUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                });
            }
            continue;
        }

        let value = field.text().await.map_err(bad_form)?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "barcode" => form.barcode = Some(value),
            "price" => form.price = Some(value),
            "sell_price" => form.sell_price = Some(value),
            "stock" => form.stock = Some(value),
            _ => {}
        }
    }

    let input = form_to_input(&form)?;
    Ok((input, form.image))
}

fn form_to_input(form: &ProductForm) -> Result<ProductInput, ValidationError> {
    Ok(ProductInput {
        title: required("title", &form.title)?.to_string(),
        description: form.description.clone().unwrap_or_default(),
        barcode: form.barcode.clone(),
        price: parse_cents("price", &form.price)?,
        sell_price: parse_cents("sell_price", &form.sell_price)?,
        stock: required("stock", &form.stock)?
            .parse::<Quantity>()
            .map_err(|_| invalid_number("stock"))?,
    })
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::Required {
            field: field.to_string(),
        })
}

fn parse_cents(field: &str, value: &Option<String>) -> Result<Money, ValidationError> {
    required(field, value)?
        .parse::<i64>()
        .map(Money::from_cents)
        .map_err(|_| invalid_number(field))
}

fn invalid_number(field: &str) -> ValidationError {
    ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a number".to_string(),
    }
}
