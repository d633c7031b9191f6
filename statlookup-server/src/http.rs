//! statlookup HTTP server
//!
//! Axum router exposing the WDS proxy endpoints, the local lookup file and the
//! server-rendered UI. Every proxy endpoint has a thin axum handler that hands
//! the raw method/query/body to an inner function in [`crate::proxy`], which is
//! what the tests call directly.
//!
//! Endpoints:
//! - POST     /getCubeMetadata     — WDS getCubeMetadata
//! - POST     /getDataFromVectors  — WDS getDataFromVectorsAndLatestNPeriods
//! - POST     /getSeriesInfo       — WDS getSeriesInfoFromVector
//! - GET|POST /statscan            — comma-list vector fetch
//! - GET      /data.json           — product lookup table
//! - GET      /health, /version
//! - GET      /, /ui/lookup, /ui/vector — HTML pages
//!
//! The proxy endpoints are also mounted under `/.netlify/functions/` so pages
//! written against the old function paths keep working.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{any, get};
use axum::{Json, Router};
use bytes::Bytes;
use statlookup_core::{LookupTable, StatConfig, WdsClient};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::proxy::{cube_metadata_inner, series_info_inner, statscan_inner, vector_data_inner};
use crate::ui;

pub const LEGACY_PREFIX: &str = "/.netlify/functions";

/// Shared state for all HTTP handlers
pub struct HttpState {
    pub config: StatConfig,
    pub wds: WdsClient,
    pub lookup: LookupTable,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    let proxies = Router::new()
        .route("/getCubeMetadata", any(cube_metadata_handler))
        .route("/getDataFromVectors", any(vector_data_handler))
        .route("/getSeriesInfo", any(series_info_handler))
        .route("/statscan", any(statscan_handler));

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/ui/lookup", get(ui::lookup_handler))
        .route("/ui/vector", get(ui::vector_handler))
        .route("/data.json", get(data_json_handler))
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .merge(proxies.clone())
        .nest(LEGACY_PREFIX, proxies)
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    state: HttpState,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = state.config.http_addr();
    let service = state.config.service.name.clone();
    let app = build_router(Arc::new(state));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(service = %service, "Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

pub fn health_inner(state: &HttpState) -> serde_json::Value {
    serde_json::json!({
        "status": "healthy",
        "service": state.config.service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "upstream": state.wds.base_url(),
        "lookup_entries": state.lookup.len(),
    })
}

pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "protocol": "wds-proxy/1",
    })
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn cube_metadata_handler(
    State(state): State<Arc<HttpState>>,
    method: Method,
    body: Bytes,
) -> impl IntoResponse {
    cube_metadata_inner(&state.wds, &method, &body).await
}

pub async fn vector_data_handler(
    State(state): State<Arc<HttpState>>,
    method: Method,
    body: Bytes,
) -> impl IntoResponse {
    vector_data_inner(&state.wds, &method, &body).await
}

pub async fn series_info_handler(
    State(state): State<Arc<HttpState>>,
    method: Method,
    body: Bytes,
) -> impl IntoResponse {
    series_info_inner(&state.wds, &method, &body).await
}

pub async fn statscan_handler(
    State(state): State<Arc<HttpState>>,
    method: Method,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> impl IntoResponse {
    statscan_inner(&state.wds, &method, &query, &body).await
}

pub async fn data_json_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    Json(state.lookup.entries().to_vec())
}

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(health_inner(&state)))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}
