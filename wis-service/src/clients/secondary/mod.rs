//! Legacy issue tracker client
//!
//! Work-item-tracking REST API: single work items, saved queries, ad-hoc WIQL
//! queries and batched field reads. Authenticates with a personal access token.

pub mod fields;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;
use wis_common::config::SecondaryConfig;
use wis_common::models::{BugPayloadRecord, LegacyWorkItem};
use wis_common::WorkItemId;

use self::fields::{names, TrackerWorkItem};
use super::{cancellable, join_url, BackendError, SecondaryBackend};

/// Result of a saved or WIQL query: flat lists or link trees
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResult {
    #[serde(default)]
    work_items: Vec<WorkItemReference>,
    #[serde(default)]
    work_item_relations: Vec<WorkItemLink>,
}

#[derive(Debug, Deserialize)]
struct WorkItemReference {
    id: WorkItemId,
}

#[derive(Debug, Deserialize)]
struct WorkItemLink {
    source: Option<WorkItemReference>,
    target: Option<WorkItemReference>,
}

impl QueryResult {
    /// Distinct work item ids, in first-seen order
    fn work_item_ids(&self) -> Vec<WorkItemId> {
        let mut seen = BTreeSet::new();
        let flat = self.work_items.iter().map(|r| r.id);
        let linked = self
            .work_item_relations
            .iter()
            .flat_map(|link| [link.source.as_ref(), link.target.as_ref()])
            .flatten()
            .map(|r| r.id);

        flat.chain(linked).filter(|id| seen.insert(*id)).collect()
    }
}

#[derive(Debug, Serialize)]
struct WiqlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Serialize)]
struct BatchRequest<'a> {
    ids: &'a [WorkItemId],
    fields: &'a [&'a str],
}

#[derive(Debug, Default, Deserialize)]
struct BatchResponse {
    #[serde(default)]
    value: Vec<TrackerWorkItem>,
}

/// Quote a WIQL string literal
pub fn wiql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// WIQL selecting the approved, active-or-fixed bugs of the given products and releases
pub fn bugs_for_products_and_releases_query(
    project: &str,
    products: &[String],
    releases: &[String],
) -> String {
    let products: Vec<String> = products.iter().map(|p| wiql_literal(p)).collect();
    let releases: Vec<String> = releases.iter().map(|r| wiql_literal(r)).collect();

    format!(
        "SELECT [{id}] FROM WorkItems \
         WHERE [Work Item Type] = 'Bug' \
         AND [Team Project] = {project} \
         AND [Issue Type] <> 'Test Defect' \
         AND ([State] = 'Active' OR [Resolved Reason] = 'Fixed') \
         AND [Triage] CONTAINS 'Approved' \
         AND [Product] IN ({products}) \
         AND [Release] IN ({releases})",
        id = names::ID,
        project = wiql_literal(project),
        products = products.join(","),
        releases = releases.join(","),
    )
}

/// Legacy issue tracker client
pub struct SecondaryClient {
    http_client: reqwest::Client,
    base_url: String,
    project: String,
    api_version: String,
    personal_access_token: Option<String>,
    batch_size: usize,
}

impl SecondaryClient {
    pub fn new(config: &SecondaryConfig) -> Result<Self, BackendError> {
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
            project: config.project.clone(),
            api_version: config.api_version.clone(),
            personal_access_token: config.personal_access_token.clone(),
            batch_size: config.batch_size.max(1),
        })
    }

    fn url(&self, route: &str) -> String {
        join_url(&self.base_url, route)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.query(&[("api-version", self.api_version.as_str())]);
        match &self.personal_access_token {
            Some(pat) => request.basic_auth("", Some(pat)),
            None => request,
        }
    }

    /// Send a request; `Ok(None)` on 404, `Forbidden` on 401/403
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        route: &str,
        resource: &str,
    ) -> Result<Option<T>, BackendError> {
        debug!(route = %route, "Querying legacy tracker");

        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport {
                route: route.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Forbidden {
                resource: resource.to_string(),
            });
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

        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| BackendError::Decode {
                route: route.to_string(),
                message: e.to_string(),
            })
    }

    async fn fetch_work_item(&self, id: WorkItemId) -> Result<Option<LegacyWorkItem>, BackendError> {
        let route = format!("_apis/wit/workitems/{}", id);
        let request = self
            .http_client
            .get(self.url(&route))
            .query(&[("$expand", "relations")]);

        let item: Option<TrackerWorkItem> = self
            .send_json(request, &route, &format!("WorkItem: {}", id))
            .await?;
        Ok(item.map(|item| fields::to_legacy_work_item(&item)))
    }

    async fn run_saved_query(&self, query_id: Uuid) -> Result<Vec<BugPayloadRecord>, BackendError> {
        let route = format!("{}/_apis/wit/wiql/{}", self.project, query_id);
        let request = self.http_client.get(self.url(&route));
        let resource = format!("Query: {}", query_id);

        let result: QueryResult = self
            .send_json(request, &route, &resource)
            .await?
            .ok_or_else(|| BackendError::Status {
                route: route.clone(),
                status: StatusCode::NOT_FOUND.as_u16(),
                body: format!("{} does not exist", resource),
            })?;

        self.fetch_payload_records(&result.work_item_ids()).await
    }

    async fn run_wiql(&self, query: &str) -> Result<Vec<BugPayloadRecord>, BackendError> {
        let route = format!("{}/_apis/wit/wiql", self.project);
        let request = self
            .http_client
            .post(self.url(&route))
            .json(&WiqlRequest { query });

        let result: Option<QueryResult> = self.send_json(request, &route, "WIQL query").await?;
        let ids = result.map(|r| r.work_item_ids()).unwrap_or_default();
        self.fetch_payload_records(&ids).await
    }

    /// Read the payload fields of `ids`, `batch_size` work items per request
    async fn fetch_payload_records(
        &self,
        ids: &[WorkItemId],
    ) -> Result<Vec<BugPayloadRecord>, BackendError> {
        let route = "_apis/wit/workitemsbatch";
        let mut records = Vec::with_capacity(ids.len());

        for batch in ids.chunks(self.batch_size) {
            let request = self.http_client.post(self.url(route)).json(&BatchRequest {
                ids: batch,
                fields: &names::PAYLOAD_FIELDS,
            });

            let response: Option<BatchResponse> =
                self.send_json(request, route, "Work item batch").await?;
            records.extend(
                response
                    .unwrap_or_default()
                    .value
                    .iter()
                    .map(fields::to_bug_payload_record),
            );
        }

        Ok(records)
    }
}

#[async_trait]
impl SecondaryBackend for SecondaryClient {
    async fn get_work_item(
        &self,
        id: WorkItemId,
        cancel: &CancellationToken,
    ) -> Result<Option<LegacyWorkItem>, BackendError> {
        cancellable(cancel, self.fetch_work_item(id)).await
    }

    async fn get_payloads_by_query(
        &self,
        query_id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<Vec<BugPayloadRecord>, BackendError> {
        if query_id.is_nil() {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        let result = cancellable(cancel, self.run_saved_query(query_id)).await;
        info!(
            query_id = %query_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Bug list query completed"
        );
        result
    }

    async fn get_bugs_for_products_and_releases(
        &self,
        products: &[String],
        releases: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<BugPayloadRecord>, BackendError> {
        info!(?products, ?releases, "Querying bug work items for products and releases");

        let query = bugs_for_products_and_releases_query(&self.project, products, releases);
        let started = Instant::now();
        let result = cancellable(cancel, self.run_wiql(&query)).await;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Product and release bug query completed"
        );
        result
    }
}
