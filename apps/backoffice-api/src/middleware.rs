//! # Request Gates
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  request ──► authenticate ──► require_permission("products") ──► handler│
//! │                  │                      │                               │
//! │          Cookie: jwt=...        GET/HEAD → view_products                │
//! │          → Principal(id)        else     → edit_products                │
//! │          or 401                 re-read from the role on every call     │
//! │                                 or 403                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use tally_core::permission::AccessVerb;
use tracing::debug;

use crate::auth::extract_cookie_token;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Id of the authenticated user, placed in request extensions by
/// [`authenticate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .copied()
            .ok_or_else(|| ApiError::unauthenticated("not signed in"))
    }
}

/// Verifies the session cookie and records the principal.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(extract_cookie_token)
        .ok_or_else(|| ApiError::unauthenticated("not signed in"))?;

    let user_id = state.tokens.verify(token)?;
    request.extensions_mut().insert(Principal(user_id));

    Ok(next.run(request).await)
}

/// State for [`require_permission`]: which resource the route group guards.
#[derive(Clone)]
pub struct Gate {
    pub state: AppState,
    pub resource: &'static str,
}

/// Checks `{verb}_{resource}` for the principal, verb taken from the method.
pub async fn require_permission(
    State(gate): State<Gate>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .copied()
        .ok_or_else(|| ApiError::unauthenticated("not signed in"))?;

    let verb = AccessVerb::from_method(request.method().as_str());
    gate.state
        .db
        .authorizer()
        .authorize(principal.0, gate.resource, verb)
        .await?;

    debug!(user_id = principal.0, resource = gate.resource, %verb, "Access granted");
    Ok(next.run(request).await)
}
