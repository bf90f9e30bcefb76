use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{ItemResponse, LoginRequest, LoginResponse, SuccessResponse};
use crate::models::identity::IdentityView;
use crate::utils::auth::require_session;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Resolve credentials and open a session
///
/// POST /login  {"username": "...", "password": "..."}
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let identity = match state.resolver.resolve(&request.username, &request.password).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(username = %request.username, error = %e, "Login failed");
            return Err(e.into());
        }
    };

    let session = state.sessions.create(identity);

    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            success: true,
            token: session.token.clone(),
            expires_at: session.expires_at,
            identity: IdentityView::from(&session.identity),
        }),
    )
        .into_response())
}

/// POST /logout
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    state.sessions.invalidate(&session.token);

    info!(user_id = %session.identity.id(), "Logged out");

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: "Logged out".to_string(),
        }),
    )
        .into_response())
}

/// GET /me
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    Ok((
        StatusCode::OK,
        Json(ItemResponse::new(IdentityView::from(&session.identity))),
    )
        .into_response())
}
