//! Backend clients
//!
//! The resolver talks to both backends through the `PrimaryBackend` and
//! `SecondaryBackend` traits. Absence is `Ok(None)`, never an error, so the
//! resolver can tell "not here" apart from "backend broken".

pub mod primary;
pub mod secondary;

use async_trait::async_trait;
use std::future::Future;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use wis_common::models::{
    BugPayloadRecord, HotpatchCandidate, LegacyWorkItem, RebaseBaselines, ReleaseTicket,
};
use wis_common::{ResolutionError, StatusClass, WorkItemId};

pub use primary::PrimaryClient;
pub use secondary::SecondaryClient;

/// Backend client errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request to {route} failed: {message}")]
    Transport { route: String, message: String },

    #[error("Request to {route} returned {status}: {body}")]
    Status {
        route: String,
        status: u16,
        body: String,
    },

    #[error("Unable to decode response from {route}: {message}")]
    Decode { route: String, message: String },

    #[error("{resource} is protected; the service has no permission to read it")]
    Forbidden { resource: String },

    #[error("Request cancelled")]
    Cancelled,
}

impl From<BackendError> for ResolutionError {
    fn from(err: BackendError) -> Self {
        match &err {
            BackendError::Forbidden { .. } => ResolutionError::bad_request(err.to_string()),
            BackendError::Status { status, .. } => {
                ResolutionError::new(StatusClass::from_http_status(*status), err.to_string())
            }
            _ => ResolutionError::internal(err.to_string()),
        }
    }
}

/// Release ticket service
#[async_trait]
pub trait PrimaryBackend: Send + Sync {
    async fn get_ticket(
        &self,
        id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<ReleaseTicket>, BackendError>;

    async fn get_all_active_tickets(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReleaseTicket>, BackendError>;

    async fn get_rebase_baselines(
        &self,
        ticket_id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<RebaseBaselines>, BackendError>;

    async fn get_hotpatch_baseline(
        &self,
        ticket_id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<HotpatchCandidate>, BackendError>;
}

/// Legacy issue tracker
#[async_trait]
pub trait SecondaryBackend: Send + Sync {
    async fn get_work_item(
        &self,
        id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<LegacyWorkItem>, BackendError>;

    /// Payload records of every bug returned by a saved query
    async fn get_payloads_by_query(
        &self,
        query_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<BugPayloadRecord>, BackendError>;

    /// Payload records of approved bugs filed against any product/release pair
    async fn get_bugs_for_products_and_releases(
        &self,
        products: &[String],
        releases: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<BugPayloadRecord>, BackendError>;
}

/// Run a backend call, abandoning it as soon as `cancel` fires
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, call: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(BackendError::Cancelled),
        result = call => result,
    }
}

/// Join a configured base URL and a relative route
pub(crate) fn join_url(base_url: &str, route: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        route.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_maps_to_bad_request() {
        let err: ResolutionError = BackendError::Forbidden {
            resource: "WorkItem: 12".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusClass::BadRequest);
        assert!(err.message.contains("WorkItem: 12"));
    }

    #[test]
    fn test_status_maps_by_code() {
        let bad: ResolutionError = BackendError::Status {
            route: "api/v1/releasetickets/1".to_string(),
            status: 400,
            body: "bad id".to_string(),
        }
        .into();
        assert_eq!(bad.status, StatusClass::BadRequest);

        let broken: ResolutionError = BackendError::Status {
            route: "api/v1/releasetickets/1".to_string(),
            status: 503,
            body: String::new(),
        }
        .into();
        assert_eq!(broken.status, StatusClass::InternalError);
    }

    #[test]
    fn test_transport_and_cancel_are_internal() {
        let err: ResolutionError = BackendError::Cancelled.into();
        assert_eq!(err.status, StatusClass::InternalError);

        let err: ResolutionError = BackendError::Transport {
            route: "x".to_string(),
            message: "connection refused".to_string(),
        }
        .into();
        assert_eq!(err.status, StatusClass::InternalError);
    }

    #[test]
    fn test_join_url() {
        assert_eq!(join_url("https://a.example/", "/api/v1/x"), "https://a.example/api/v1/x");
        assert_eq!(join_url("https://a.example", "api/v1/x"), "https://a.example/api/v1/x");
    }

    #[tokio::test]
    async fn test_cancellable_stops_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<(), BackendError> =
            cancellable(&cancel, std::future::pending::<Result<(), BackendError>>()).await;
        assert!(matches!(result, Err(BackendError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancellable_passes_result_through() {
        let cancel = CancellationToken::new();
        let result = cancellable(&cancel, async { Ok::<_, BackendError>(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
