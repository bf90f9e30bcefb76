use crate::auth::session::Session;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use tracing::debug;

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// The live session behind the request's bearer token
pub fn require_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let Some(token) = bearer_token(headers) else {
        debug!("Request without bearer token");
        return Err(ApiError::Unauthorized);
    };
    state.sessions.get(token).ok_or(ApiError::Unauthorized)
}
