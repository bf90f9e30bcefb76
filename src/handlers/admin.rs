use crate::accounts;
use crate::attendance::recorder;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::account::{AccountUpdate, NewAccount};
use crate::models::api::{ItemResponse, ListResponse, SuccessResponse};
use crate::models::identity::Role;
use crate::utils::auth::require_session;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

fn parse_role(role: &str) -> Result<Role, ApiError> {
    role.parse().map_err(|e: String| {
        warn!(role = %role, "Unknown role in admin path");
        ApiError::InvalidParameter(e)
    })
}

/// List accounts of one role
///
/// GET /admin/users/{role}
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    Path(role): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let role = parse_role(&role)?;

    let accounts = accounts::list(state.store.as_ref(), &session.identity, role).await?;

    Ok((StatusCode::OK, Json(ListResponse::new(accounts))).into_response())
}

/// Create an account in one role table
///
/// POST /admin/users/{role}
pub async fn create_user_handler(
    State(state): State<Arc<AppState>>,
    Path(role): Path<String>,
    headers: HeaderMap,
    Json(new): Json<NewAccount>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let role = parse_role(&role)?;

    let created = {
        let _guard = state.account_writes.lock().await;
        accounts::create(state.store.as_ref(), &state.hasher, &session.identity, role, new).await?
    };

    Ok((StatusCode::CREATED, Json(ItemResponse::new(created))).into_response())
}

/// Edit an account; omitted fields are left as they are
///
/// PATCH /admin/users/{role}/{id}
pub async fn update_user_handler(
    State(state): State<Arc<AppState>>,
    Path((role, id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(changes): Json<AccountUpdate>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let role = parse_role(&role)?;

    let updated = {
        let _guard = state.account_writes.lock().await;
        accounts::update(state.store.as_ref(), &state.hasher, &session.identity, role, &id, changes).await?
    };

    Ok((StatusCode::OK, Json(ItemResponse::new(updated))).into_response())
}

/// GET /admin/overview
pub async fn overview_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let counts = accounts::overview(state.store.as_ref(), &session.identity).await?;

    Ok((StatusCode::OK, Json(ItemResponse::new(counts))).into_response())
}

/// Students assigned to one supervisor
///
/// GET /admin/supervisors/{id}/students
pub async fn supervisor_students_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let students = recorder::roster(state.store.as_ref(), &session.identity, &id).await?;

    Ok((StatusCode::OK, Json(ListResponse::new(students))).into_response())
}

/// DELETE /admin/users/{role}/{id}
pub async fn delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path((role, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let role = parse_role(&role)?;

    accounts::delete(state.store.as_ref(), &session.identity, role, &id).await?;

    let ended = state.sessions.invalidate_identity(role, &id);
    if ended > 0 {
        info!(role = %role, account_id = %id, sessions = ended, "Ended sessions of deleted account");
    }

    Ok((
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: format!("Deleted {} {}", role, id),
        }),
    )
        .into_response())
}
