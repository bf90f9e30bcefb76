// Centralized error handling for dormhub

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;

/// Errors from the hosted data service (or the in-memory stand-in)
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Request to data service failed for {table}: {reason}")]
    Request { table: String, reason: String },

    #[error("Data service returned status {status} for {table}")]
    Status { table: String, status: u16 },

    #[error("Failed to decode {table} rows: {reason}")]
    Decode { table: String, reason: String },

    #[error("Row conflicts with an existing row in {0}")]
    Conflict(String),

    #[error("Table {0} is unavailable")]
    Unavailable(String),
}

/// Login failures surfaced to the caller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Credential lookup unavailable: {0}")]
    ResolverUnavailable(String),
}

/// Internal to the visibility filter. Always logged and converted to an
/// empty result, never returned to callers.
#[derive(Error, Debug)]
pub enum VisibilityError {
    #[error("Attendance visibility query failed: {0}")]
    VisibilityQueryFailed(#[from] StoreError),
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid field format: {0}")]
    InvalidFormat(String),
}

/// Errors from the supervisor attendance workflow
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Only supervisors may {0}")]
    Forbidden(&'static str),

    #[error("Student not found: {0}")]
    StudentNotFound(String),

    #[error("Student {0} is not assigned to this supervisor")]
    NotAssigned(String),

    #[error("Supervisor not found: {0}")]
    SupervisorNotFound(String),

    #[error("Supervisors may only view their own students")]
    OtherRoster,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from account administration
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("Only administrators may manage accounts")]
    Forbidden,

    #[error("Username {0:?} is already in use")]
    UsernameTaken(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Failed to hash password: {0}")]
    Hash(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Body of every JSON error response
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Errors returned by HTTP handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Login failed. Please try again.")]
    Unavailable,

    #[error("Missing or expired session")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::ResolverUnavailable(_) => ApiError::Unavailable,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(_) => ApiError::Conflict(e.to_string()),
            _ => ApiError::InternalError(e.to_string()),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(e: RecordError) -> Self {
        match e {
            RecordError::Forbidden(_) => ApiError::Forbidden(e.to_string()),
            RecordError::StudentNotFound(_) => ApiError::NotFound(e.to_string()),
            RecordError::NotAssigned(_) => ApiError::Forbidden(e.to_string()),
            RecordError::SupervisorNotFound(_) => ApiError::NotFound(e.to_string()),
            RecordError::OtherRoster => ApiError::Forbidden(e.to_string()),
            RecordError::Invalid(inner) => ApiError::InvalidParameter(inner.to_string()),
            RecordError::Store(inner) => inner.into(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(e: AccountError) -> Self {
        match e {
            AccountError::Forbidden => ApiError::Forbidden(e.to_string()),
            AccountError::UsernameTaken(_) => ApiError::Conflict(e.to_string()),
            AccountError::NotFound(_) => ApiError::NotFound(e.to_string()),
            AccountError::Hash(_) => ApiError::InternalError(e.to_string()),
            AccountError::Invalid(inner) => ApiError::InvalidParameter(inner.to_string()),
            AccountError::Store(inner) => inner.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
