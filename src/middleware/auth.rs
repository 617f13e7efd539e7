//! Bearer-token guard for protected routes. Verification is stateless; the
//! user row is loaded once and stashed as a request extension for handlers.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::repositories::user as user_repo;
use crate::state::AppState;

const INVALID_TOKEN: &str = "Token is invalid or expired";

pub async fn auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        AppError::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;

    let claims = state
        .codec
        .verify(&token)
        .map_err(|_| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;
    let user = user_repo::find_user_by_id(&state.pool, user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::Unauthorized(INVALID_TOKEN.to_string()))?;

    request.extensions_mut().insert(claims);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
