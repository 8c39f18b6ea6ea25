//! wis-service library - Work Item Service
//!
//! Resolves work items, their binary/component payloads and their baselines
//! across the release ticket service and the legacy issue tracker.

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod baseline;
pub mod clients;
pub mod error;
pub mod payload;
pub mod resolver;

pub use resolver::SourceResolver;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<SourceResolver>,
}

impl AppState {
    /// Create new application state
    pub fn new(resolver: SourceResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let workitems = Router::new()
        .route(
            "/api/v1/workitems/releasemonth/:release_month/product/:product",
            get(api::get_release_month),
        )
        .route("/api/v1/workitems/:id", get(api::get_work_item))
        .route("/api/v1/workitems/:id/payload", get(api::get_payloads))
        .route("/api/v1/workitems/:id/baseline", get(api::get_baseline))
        .route(
            "/api/v1/workitems/:id/baseline/hotpatch",
            get(api::get_hotpatch_baseline),
        );

    Router::new()
        .merge(workitems)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
