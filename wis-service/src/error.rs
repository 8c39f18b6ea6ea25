//! Error types for wis-service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};
use wis_common::{ResolutionError, StatusClass};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ResolutionError> for ApiError {
    fn from(err: ResolutionError) -> Self {
        if err.is_expected() {
            info!(status = ?err.status, "{}", err.message);
        } else {
            error!(status = ?err.status, "{}", err.message);
        }

        match err.status {
            StatusClass::NotFound => ApiError::NotFound(err.message),
            StatusClass::BadRequest => ApiError::BadRequest(err.message),
            StatusClass::InternalError => ApiError::Internal(err.message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (class, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusClass::NotFound, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusClass::BadRequest, "BAD_REQUEST", msg),
            ApiError::Internal(msg) => (StatusClass::InternalError, "INTERNAL_ERROR", msg),
        };
        let status = StatusCode::from_u16(class.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_mapping() {
        assert!(matches!(
            ApiError::from(ResolutionError::not_found("gone")),
            ApiError::NotFound(msg) if msg == "gone"
        ));
        assert!(matches!(
            ApiError::from(ResolutionError::bad_request("bad")),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(ResolutionError::internal("boom")),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_status_codes() {
        let response = ApiError::NotFound("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::BadRequest("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::Internal("x".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
