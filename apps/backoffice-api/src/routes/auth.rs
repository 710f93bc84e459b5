//! Sign-up, sign-in and the signed-in user's own profile.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;
use serde_json::json;
use tally_core::input::{LoginInput, PasswordInput, ProfileInput, RegisterInput};
use tally_core::User;
use tally_db::password::{hash_password, verify_password};
use tally_db::NewUser;
use tracing::info;

use crate::auth::{expired_cookie, session_cookie};
use crate::error::{ApiError, ApiResult};
use crate::middleware::Principal;
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let input = input.validate()?;
    let password_hash = hash_password(&input.password)?;

    let user = state
        .db
        .users()
        .create(NewUser {
            first_name: &input.first_name,
            last_name: &input.last_name,
            email: &input.email,
            password_hash: &password_hash,
            role_id: state.config.default_role_id,
        })
        .await?;

    info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> ApiResult<impl IntoResponse> {
    let invalid = || ApiError::unauthenticated("invalid credentials");

    let email = input.email.trim().to_lowercase();
    let credentials = state
        .db
        .users()
        .get_credentials_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&input.password, &credentials.password_hash) {
        return Err(invalid());
    }

    let user = state
        .db
        .users()
        .get(credentials.id)
        .await?
        .ok_or_else(invalid)?;

    let token = state.tokens.issue(user.id)?;
    let cookie = session_cookie(
        &token,
        state.tokens.lifetime_secs(),
        state.config.cookie_secure,
    );

    info!(user_id = user.id, "User signed in");
    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Json(user)))
}

pub async fn logout(State(state): State<AppState>, _principal: Principal) -> impl IntoResponse {
    (
        AppendHeaders([(SET_COOKIE, expired_cookie(state.config.cookie_secure))]),
        Json(json!({ "message": "success" })),
    )
}

pub async fn current_user(
    State(state): State<AppState>,
    Principal(user_id): Principal,
) -> ApiResult<Json<User>> {
    let user = state
        .db
        .users()
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::unauthenticated("account no longer exists"))?;
    Ok(Json(user))
}

pub async fn update_info(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(input): Json<ProfileInput>,
) -> ApiResult<Json<User>> {
    let input = input.validate()?;
    let user = state
        .db
        .users()
        .update_info(user_id, &input.first_name, &input.last_name, &input.email)
        .await?;
    Ok(Json(user))
}

pub async fn update_password(
    State(state): State<AppState>,
    Principal(user_id): Principal,
    Json(input): Json<PasswordInput>,
) -> ApiResult<StatusCode> {
    input.validate()?;
    let password_hash = hash_password(&input.password)?;
    state
        .db
        .users()
        .update_password_hash(user_id, &password_hash)
        .await?;

    info!(user_id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}
