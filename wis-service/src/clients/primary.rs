//! Release ticket service client
//!
//! JSON over HTTPS. Single-record routes answer 404 or 204 when the record
//! does not exist; transport failures and 5xx responses are retried with a
//! linear back-off.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wis_common::config::PrimaryConfig;
use wis_common::models::{HotpatchCandidate, RebaseBaselines, ReleaseTicket};
use wis_common::WorkItemId;

use super::{cancellable, join_url, BackendError, PrimaryBackend};

const ACTIVE_TICKETS_ROUTE: &str = "api/v1/releasetickets/active";

/// Release ticket service client
pub struct PrimaryClient {
    http_client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
    retry_attempts: u32,
    retry_backoff: Duration,
}

impl PrimaryClient {
    pub fn new(config: &PrimaryConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport {
                route: config.base_url.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            bearer_token: config.bearer_token.clone(),
            retry_attempts: config.retry_attempts.max(1),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        })
    }

    /// GET a JSON document; `Ok(None)` on 404, on 204 and on an empty body
    async fn get_json<T: DeserializeOwned>(&self, route: &str) -> Result<Option<T>, BackendError> {
        let url = join_url(&self.base_url, route);
        let mut attempt = 1;

        loop {
            debug!(route = %route, attempt, "Querying release ticket service");

            let mut request = self.http_client.get(&url);
            if let Some(token) = &self.bearer_token {
                request = request.bearer_auth(token);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if attempt < self.retry_attempts => {
                    warn!(route = %route, attempt, error = %e, "Release ticket service unreachable, retrying");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => {
                    return Err(BackendError::Transport {
                        route: route.to_string(),
                        message: e.to_string(),
                    })
                }
            };

            let status = response.status();
            if status == StatusCode::NOT_FOUND || status == StatusCode::NO_CONTENT {
                return Ok(None);
            }

            if status.is_server_error() && attempt < self.retry_attempts {
                warn!(route = %route, attempt, status = status.as_u16(), "Release ticket service error, retrying");
                tokio::time::sleep(self.retry_backoff * attempt).await;
                attempt += 1;
                continue;
            }

            let body = response.text().await.map_err(|e| BackendError::Transport {
                route: route.to_string(),
                message: e.to_string(),
            })?;

            if !status.is_success() {
                return Err(BackendError::Status {
                    route: route.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            if body.trim().is_empty() {
                return Ok(None);
            }

            return serde_json::from_str(&body)
                .map(Some)
                .map_err(|e| BackendError::Decode {
                    route: route.to_string(),
                    message: e.to_string(),
                });
        }
    }
}

#[async_trait]
impl PrimaryBackend for PrimaryClient {
    async fn get_ticket(
        &self,
        id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<ReleaseTicket>, BackendError> {
        let route = format!("api/v1/releasetickets/{}", id);
        cancellable(cancel, self.get_json(&route)).await
    }

    async fn get_all_active_tickets(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ReleaseTicket>, BackendError> {
        let tickets: Option<Vec<ReleaseTicket>> =
            cancellable(cancel, self.get_json(ACTIVE_TICKETS_ROUTE)).await?;
        let tickets = tickets.unwrap_or_default();

        debug!(count = tickets.len(), "Retrieved active release tickets");
        Ok(tickets)
    }

    async fn get_rebase_baselines(
        &self,
        ticket_id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<RebaseBaselines>, BackendError> {
        let route = format!("api/v1/baseline/rebase/{}", ticket_id);
        cancellable(cancel, self.get_json(&route)).await
    }

    async fn get_hotpatch_baseline(
        &self,
        ticket_id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<HotpatchCandidate>, BackendError> {
        let route = format!("api/v1/baseline/hotpatch/{}", ticket_id);
        cancellable(cancel, self.get_json(&route)).await
    }
}
