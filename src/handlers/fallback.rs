use crate::core::error::ApiError;
use axum::http::{Method, Uri};
use tracing::debug;

pub async fn fallback_handler(method: Method, uri: Uri) -> ApiError {
    debug!(method = %method, path = %uri.path(), "No route matched");
    ApiError::NotFound(format!("no endpoint at {} {}", method, uri.path()))
}
