//! Staff account administration. Guarded by `users`.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tally_core::input::{NewUserInput, UserInput};
use tally_core::{normalize_page, Page, User};
use tally_db::password::hash_password;
use tally_db::NewUser;
use tracing::info;

use super::PageQuery;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list).post(create))
        .route("/api/users/{id}", get(show).put(update).delete(remove))
}

async fn list(State(state): State<AppState>, Query(q): Query<PageQuery>) -> ApiResult<Json<Page<User>>> {
    Ok(Json(state.db.users().list_paged(normalize_page(q.page)).await?))
}

async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewUserInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let input = input.validate()?;
    ensure_role_exists(&state, input.role_id).await?;
    let password_hash = hash_password(&input.password)?;

    let user = state
        .db
        .users()
        .create(NewUser {
            first_name: &input.first_name,
            last_name: &input.last_name,
            email: &input.email,
            password_hash: &password_hash,
            role_id: input.role_id,
        })
        .await?;

    info!(user_id = user.id, role_id = user.role_id, "User created");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("User not found: {id}")))?;
    Ok(Json(user))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<UserInput>,
) -> ApiResult<Json<User>> {
    let input = input.validate()?;
    ensure_role_exists(&state, input.role_id).await?;

    let user = state
        .db
        .users()
        .update(id, &input.first_name, &input.last_name, &input.email, input.role_id)
        .await?;
    Ok(Json(user))
}

async fn remove(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<StatusCode> {
    state.db.users().delete(id).await?;
    info!(user_id = id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn ensure_role_exists(state: &AppState, role_id: i64) -> ApiResult<()> {
    match state.db.roles().get(role_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::not_found(format!("Role not found: {role_id}"))),
    }
}
