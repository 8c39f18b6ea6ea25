//! Work item API
//!
//! Thin handlers over `SourceResolver`. Each request gets its own
//! cancellation token, cancelled when the handler future is dropped, so a
//! disconnected caller stops the backend calls made on its behalf.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use wis_common::models::{
    BaselineInfo, CanonicalWorkItem, HotpatchBaseline, PackagingWorkItems, WorkItemPayloads,
};
use wis_common::{ResolutionError, WorkItemId};

use crate::error::{ApiError, ApiResult};
use crate::resolver::validate_id;
use crate::AppState;

/// Query parameters for payload retrieval
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadQuery {
    /// Fan out to every bug sharing the item's product and release
    #[serde(default)]
    pub include_children: bool,

    /// Use the release ticket's saved bug list query
    #[serde(default)]
    pub include_bug_list: bool,
}

/// Parse a path id; non-numeric and non-positive ids are rejected
fn parse_id(raw: &str) -> ApiResult<WorkItemId> {
    let id: i64 = raw.trim().parse().map_err(|_| {
        ApiError::from(ResolutionError::bad_request(format!(
            "WorkItem Id must be an integer greater than 0 but was {}.",
            raw
        )))
    })?;
    Ok(validate_id(id)?)
}

fn not_found<T>(type_name: &str, id: WorkItemId) -> ApiResult<T> {
    Err(ResolutionError::not_found(format!(
        "{} not found for WorkItem Id: {}",
        type_name, id
    ))
    .into())
}

/// GET /api/v1/workitems/:id
pub async fn get_work_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<CanonicalWorkItem>> {
    let id = parse_id(&raw_id)?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    debug!(work_item_id = id, "Fetching work item");
    let item = state.resolver.resolve_work_item(id, &cancel).await?;
    Ok(Json(item))
}

/// GET /api/v1/workitems/:id/payload
pub async fn get_payloads(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(query): Query<PayloadQuery>,
) -> ApiResult<Json<WorkItemPayloads>> {
    let id = parse_id(&raw_id)?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    debug!(
        work_item_id = id,
        include_children = query.include_children,
        include_bug_list = query.include_bug_list,
        "Fetching payloads"
    );
    let payloads = state
        .resolver
        .resolve_payloads(id, query.include_children, query.include_bug_list, &cancel)
        .await?;
    Ok(Json(payloads))
}

/// GET /api/v1/workitems/:id/baseline
pub async fn get_baseline(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<BaselineInfo>> {
    let id = parse_id(&raw_id)?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match state.resolver.latest_baseline(id, &cancel).await? {
        Some(baseline) => Ok(Json(baseline)),
        None => not_found("BaselineInfo", id),
    }
}

/// GET /api/v1/workitems/:id/baseline/hotpatch
pub async fn get_hotpatch_baseline(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<HotpatchBaseline>> {
    let id = parse_id(&raw_id)?;
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    match state.resolver.hotpatch_baseline(id, &cancel).await? {
        Some(baseline) => Ok(Json(baseline)),
        None => not_found("HotpatchBaseline", id),
    }
}

/// GET /api/v1/workitems/releasemonth/:release_month/product/:product
pub async fn get_release_month(
    State(state): State<AppState>,
    Path((release_month, product)): Path<(String, String)>,
) -> ApiResult<Json<PackagingWorkItems>> {
    if release_month.trim().is_empty() || product.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Release month and product must not be empty".to_string(),
        ));
    }

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let items = state
        .resolver
        .release_month(release_month.trim(), product.trim(), &cancel)
        .await?;
    Ok(Json(items))
}
