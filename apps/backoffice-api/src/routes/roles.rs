//! Roles and their permission sets. Guarded by `roles`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tally_core::input::RoleInput;
use tally_core::{Permission, Role, RoleDetail};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/roles", get(list).post(create))
        .route("/api/roles/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Role>>> {
    Ok(Json(state.db.roles().list().await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<RoleInput>,
) -> ApiResult<(StatusCode, Json<RoleDetail>)> {
    let (name, permission_ids) = input.validate_for_create()?;
    let role = state.db.roles().create(&name, &permission_ids).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<RoleDetail>> {
    let role = state
        .db
        .roles()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Role not found: {id}")))?;
    Ok(Json(role))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<RoleInput>,
) -> ApiResult<Json<RoleDetail>> {
    let changes = input.validate_for_update()?;
    Ok(Json(state.db.roles().update(id, &changes).await?))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.roles().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Every permission, for the role editor. Any signed-in user.
pub async fn list_permissions(State(state): State<AppState>) -> ApiResult<Json<Vec<Permission>>> {
    Ok(Json(state.db.roles().list_permissions().await?))
}
