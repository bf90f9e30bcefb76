use crate::attendance::recorder;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::api::{ItemResponse, ListResponse};
use crate::models::attendance::NewAttendance;
use crate::utils::auth::require_session;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// Attendance visible to the caller, most recent first
///
/// GET /attendance
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let records = state.visibility.visible_records(&session.identity).await;

    Ok((StatusCode::OK, Json(ListResponse::new(records))).into_response())
}

/// POST /attendance (supervisors only)
pub async fn record_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(submission): Json<NewAttendance>,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let created = recorder::record(state.store.as_ref(), &session.identity, submission).await?;

    Ok((StatusCode::CREATED, Json(ItemResponse::new(created))).into_response())
}

/// GET /supervisor/students
pub async fn students_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = require_session(&state, &headers)?;
    let students = recorder::students_for(state.store.as_ref(), &session.identity).await?;

    Ok((StatusCode::OK, Json(ListResponse::new(students))).into_response())
}
