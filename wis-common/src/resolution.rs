//! Status/message failure arm shared by every resolution operation
//!
//! Expected failures (unknown ids, malformed input, backend outages) travel as
//! `Err(ResolutionError)` through plain `Result` chains, so `map`, `and_then`
//! and `?` give the short-circuit behaviour the resolver relies on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used by the resolver and its collaborators
pub type Resolution<T> = std::result::Result<T, ResolutionError>;

/// HTTP-style class of a resolution failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusClass {
    /// Malformed input (non-positive id, empty product/release, protected item)
    BadRequest,
    /// Confirmed absence after the fallback chain, or an empty filter result
    NotFound,
    /// Unexpected backend failure or internal fault
    InternalError,
}

impl StatusClass {
    /// Numeric HTTP status for this class
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::NotFound => 404,
            StatusClass::InternalError => 500,
        }
    }

    /// Map an upstream HTTP status onto a class
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => StatusClass::BadRequest,
            404 => StatusClass::NotFound,
            _ => StatusClass::InternalError,
        }
    }
}

/// Failure of a resolution operation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status:?}: {message}")]
pub struct ResolutionError {
    pub status: StatusClass,
    pub message: String,
}

impl ResolutionError {
    pub fn new(status: StatusClass, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusClass::BadRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusClass::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusClass::InternalError, message)
    }

    /// `NotFound` and `BadRequest` are ordinary outcomes and are not logged as errors
    pub fn is_expected(&self) -> bool {
        matches!(self.status, StatusClass::NotFound | StatusClass::BadRequest)
    }
}

impl From<crate::Error> for ResolutionError {
    fn from(err: crate::Error) -> Self {
        ResolutionError::internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(StatusClass::BadRequest.http_status(), 400);
        assert_eq!(StatusClass::NotFound.http_status(), 404);
        assert_eq!(StatusClass::InternalError.http_status(), 500);
    }

    #[test]
    fn test_from_http_status() {
        assert_eq!(StatusClass::from_http_status(400), StatusClass::BadRequest);
        assert_eq!(StatusClass::from_http_status(404), StatusClass::NotFound);
        assert_eq!(StatusClass::from_http_status(502), StatusClass::InternalError);
        assert_eq!(StatusClass::from_http_status(401), StatusClass::InternalError);
    }

    #[test]
    fn test_expected_outcomes() {
        assert!(ResolutionError::not_found("missing").is_expected());
        assert!(ResolutionError::bad_request("bad").is_expected());
        assert!(!ResolutionError::internal("boom").is_expected());
    }

    #[test]
    fn test_and_then_short_circuits() {
        let calls = std::cell::Cell::new(0);
        let result: Resolution<i32> = Err(ResolutionError::not_found("absent"));
        let chained = result.and_then(|v| {
            calls.set(calls.get() + 1);
            Ok(v + 1)
        });

        assert_eq!(calls.get(), 0);
        assert_eq!(chained.unwrap_err().status, StatusClass::NotFound);
    }

    #[test]
    fn test_common_error_conversion() {
        let err: ResolutionError = crate::Error::Config("nope".to_string()).into();
        assert_eq!(err.status, StatusClass::InternalError);
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn test_display_includes_message() {
        let err = ResolutionError::internal("backend down");
        assert_eq!(err.to_string(), "InternalError: backend down");
    }
}
