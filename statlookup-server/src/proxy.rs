//! WDS proxy handlers
//!
//! Four endpoints, each a pure function of (method, query, body) plus one
//! upstream call:
//! - `getCubeMetadata`    — body `[{productId}]`
//! - `getDataFromVectors` — body `[{vectorId, latestN?}]`
//! - `getSeriesInfo`      — body `[{vectorId}]`
//! - `statscan`           — query or body `{vectorIds: "v1,v2", latestN?}`
//!
//! Identifiers are normalized and invalid ones dropped before anything leaves
//! the process. A batch with nothing valid left is rejected without calling WDS.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use statlookup_core::{
    clamp_latest_n, normalize_product_id, normalize_vector_id, split_vector_ids, value_text,
    CubeMetadataRequest, SeriesInfoRequest, VectorRequest, WdsClient, WdsReply,
};

use crate::error::ProxyError;

/// Which family of endpoint answered; decides the advertised CORS methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The three per-purpose POST endpoints.
    Batch,
    /// The GET/POST `statscan` endpoint.
    Statscan,
}

impl Surface {
    pub fn allowed_methods(self) -> &'static str {
        match self {
            Surface::Batch => "POST, OPTIONS",
            Surface::Statscan => "GET, POST, OPTIONS",
        }
    }
}

/// What a proxy endpoint sends back.
#[derive(Debug, Clone, PartialEq)]
pub enum ProxyReply {
    /// CORS preflight: 200 with an empty body.
    Preflight(Surface),
    Json {
        surface: Surface,
        status: StatusCode,
        body: Value,
    },
}

impl ProxyReply {
    fn from_result(surface: Surface, result: Result<(StatusCode, Value), ProxyError>) -> Self {
        match result {
            Ok((status, body)) => ProxyReply::Json {
                surface,
                status,
                body,
            },
            Err(e) => {
                match &e {
                    ProxyError::Upstream(inner) => {
                        tracing::error!(error = %inner, "WDS call failed")
                    }
                    other => tracing::debug!(error = %other, "Proxy request rejected"),
                }
                ProxyReply::Json {
                    surface,
                    status: e.status(),
                    body: e.body(),
                }
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ProxyReply::Preflight(_) => StatusCode::OK,
            ProxyReply::Json { status, .. } => *status,
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            ProxyReply::Preflight(_) => None,
            ProxyReply::Json { body, .. } => Some(body),
        }
    }
}

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        match self {
            ProxyReply::Preflight(surface) => {
                headers.insert(
                    ACCESS_CONTROL_ALLOW_METHODS,
                    HeaderValue::from_static(surface.allowed_methods()),
                );
                headers.insert(
                    ACCESS_CONTROL_ALLOW_HEADERS,
                    HeaderValue::from_static("Content-Type"),
                );
                (StatusCode::OK, headers, ()).into_response()
            }
            ProxyReply::Json {
                surface,
                status,
                body,
            } => {
                if surface == Surface::Statscan {
                    headers.insert(
                        ACCESS_CONTROL_ALLOW_METHODS,
                        HeaderValue::from_static(surface.allowed_methods()),
                    );
                }
                (status, headers, Json(body)).into_response()
            }
        }
    }
}

// ============================================================================
// Normalization of request batches
// ============================================================================

pub fn normalize_cube_batch(items: &[Value]) -> Vec<CubeMetadataRequest> {
    items
        .iter()
        .filter_map(|item| normalize_product_id(item.get("productId")))
        .map(|product_id| CubeMetadataRequest { product_id })
        .collect()
}

pub fn normalize_vector_batch(items: &[Value]) -> Vec<VectorRequest> {
    items
        .iter()
        .filter_map(|item| {
            normalize_vector_id(item.get("vectorId")).map(|vector_id| VectorRequest {
                vector_id,
                latest_n: clamp_latest_n(item.get("latestN")),
            })
        })
        .collect()
}

pub fn normalize_series_batch(items: &[Value]) -> Vec<SeriesInfoRequest> {
    items
        .iter()
        .filter_map(|item| normalize_vector_id(item.get("vectorId")))
        .map(|vector_id| SeriesInfoRequest { vector_id })
        .collect()
}

/// `statscan` parameters: every id in the comma list shares one `latestN`.
pub fn build_statscan_batch(vector_ids: &str, latest_n: Option<&Value>) -> Vec<VectorRequest> {
    let latest_n = clamp_latest_n(latest_n);
    split_vector_ids(vector_ids)
        .into_iter()
        .map(|vector_id| VectorRequest {
            vector_id,
            latest_n,
        })
        .collect()
}

// ============================================================================
// Request plumbing
// ============================================================================

fn require_post(method: &Method) -> Result<(), ProxyError> {
    if *method == Method::POST {
        Ok(())
    } else {
        Err(ProxyError::MethodNotAllowed)
    }
}

/// Malformed JSON is treated the same as no body at all.
fn parse_body(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    serde_json::from_slice(body).ok()
}

fn parse_array_body(body: &[u8], shape: &str) -> Result<Vec<Value>, ProxyError> {
    match parse_body(body) {
        Some(Value::Array(items)) if !items.is_empty() => Ok(items),
        _ => Err(ProxyError::BadRequest(format!(
            "Body must be an array of {shape}"
        ))),
    }
}

/// First value of a repeated query parameter; later repeats are ignored.
fn first_param<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
    query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

fn upstream_status(reply: &WdsReply) -> StatusCode {
    if reply.is_success() {
        StatusCode::OK
    } else {
        StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY)
    }
}

/// 2xx collapses to 200, anything else is relayed with WDS's own status.
fn relay(reply: WdsReply) -> (StatusCode, Value) {
    (upstream_status(&reply), reply.body)
}

// ============================================================================
// Inner (directly testable) endpoint functions
// ============================================================================

pub async fn cube_metadata_inner(wds: &WdsClient, method: &Method, body: &[u8]) -> ProxyReply {
    if *method == Method::OPTIONS {
        return ProxyReply::Preflight(Surface::Batch);
    }
    ProxyReply::from_result(Surface::Batch, cube_metadata(wds, method, body).await)
}

async fn cube_metadata(
    wds: &WdsClient,
    method: &Method,
    body: &[u8],
) -> Result<(StatusCode, Value), ProxyError> {
    require_post(method)?;
    let items = parse_array_body(body, "{productId}")?;

    let payload = normalize_cube_batch(&items);
    if payload.is_empty() {
        return Err(ProxyError::BadRequest("No valid productId in body".to_string()));
    }

    tracing::info!(
        endpoint = "getCubeMetadata",
        forwarded = payload.len(),
        dropped = items.len() - payload.len(),
        "Forwarding to WDS"
    );
    Ok(relay(wds.get_cube_metadata(&payload).await?))
}

pub async fn vector_data_inner(wds: &WdsClient, method: &Method, body: &[u8]) -> ProxyReply {
    if *method == Method::OPTIONS {
        return ProxyReply::Preflight(Surface::Batch);
    }
    ProxyReply::from_result(Surface::Batch, vector_data(wds, method, body).await)
}

async fn vector_data(
    wds: &WdsClient,
    method: &Method,
    body: &[u8],
) -> Result<(StatusCode, Value), ProxyError> {
    require_post(method)?;
    let items = parse_array_body(body, "{vectorId, latestN}")?;

    let payload = normalize_vector_batch(&items);
    if payload.is_empty() {
        return Err(ProxyError::BadRequest("No valid vectorId in body".to_string()));
    }

    tracing::info!(
        endpoint = "getDataFromVectors",
        forwarded = payload.len(),
        dropped = items.len() - payload.len(),
        "Forwarding to WDS"
    );
    Ok(relay(wds.get_data_from_vectors(&payload).await?))
}

pub async fn series_info_inner(wds: &WdsClient, method: &Method, body: &[u8]) -> ProxyReply {
    if *method == Method::OPTIONS {
        return ProxyReply::Preflight(Surface::Batch);
    }
    ProxyReply::from_result(Surface::Batch, series_info(wds, method, body).await)
}

async fn series_info(
    wds: &WdsClient,
    method: &Method,
    body: &[u8],
) -> Result<(StatusCode, Value), ProxyError> {
    require_post(method)?;
    let items = parse_array_body(body, "{vectorId}")?;

    let payload = normalize_series_batch(&items);
    if payload.is_empty() {
        return Err(ProxyError::BadRequest("No valid vectorId in body".to_string()));
    }

    tracing::info!(
        endpoint = "getSeriesInfo",
        forwarded = payload.len(),
        dropped = items.len() - payload.len(),
        "Forwarding to WDS"
    );
    Ok(relay(wds.get_series_info(&payload).await?))
}

pub async fn statscan_inner(
    wds: &WdsClient,
    method: &Method,
    query: &[(String, String)],
    body: &[u8],
) -> ProxyReply {
    if *method == Method::OPTIONS {
        return ProxyReply::Preflight(Surface::Statscan);
    }
    ProxyReply::from_result(Surface::Statscan, statscan(wds, method, query, body).await)
}

async fn statscan(
    wds: &WdsClient,
    method: &Method,
    query: &[(String, String)],
    body: &[u8],
) -> Result<(StatusCode, Value), ProxyError> {
    let (vector_ids, latest_n) = if *method == Method::GET {
        (
            first_param(query, "vectorIds").unwrap_or_default().to_string(),
            first_param(query, "latestN").map(|s| Value::String(s.to_string())),
        )
    } else if *method == Method::POST {
        let body = parse_body(body).unwrap_or(Value::Null);
        (
            body.get("vectorIds").and_then(value_text).unwrap_or_default(),
            body.get("latestN").cloned(),
        )
    } else {
        return Err(ProxyError::MethodNotAllowed);
    };

    let payload = build_statscan_batch(&vector_ids, latest_n.as_ref());
    if payload.is_empty() {
        return Err(ProxyError::BadRequest(
            "Provide vectorIds as comma-separated list".to_string(),
        ));
    }

    tracing::info!(
        endpoint = "statscan",
        forwarded = payload.len(),
        latest_n = payload[0].latest_n,
        "Forwarding to WDS"
    );
    let reply = wds.get_data_from_vectors(&payload).await?;

    if !reply.is_success() {
        let status = upstream_status(&reply);
        return Ok((
            status,
            json!({ "error": "StatsCan error", "status": reply.status, "data": reply.body }),
        ));
    }

    // Raw WDS reply; the renderer picks out vectorDataPoint itself
    Ok((StatusCode::OK, reply.body))
}

// ============================================================================
// Unit Tests — call inner functions directly against a mocked WDS
// ============================================================================
