//! Server-rendered lookup pages.
//!
//! The page has two forms. Product lookup reads the in-memory table and then
//! asks WDS for the cube metadata. Vector fetch goes through the same code path
//! as `POST /getDataFromVectors` and then asks WDS for the series info. The
//! second call in each pair is a nicety: if it fails the page renders without it.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::Html;
use serde::Deserialize;
use serde_json::{json, Value};
use statlookup_core::render::{
    escape_html, render_cube_metadata, render_error, render_series_info, render_vector_data,
    render_vectors,
};

use crate::http::HttpState;
use crate::proxy::{cube_metadata_inner, series_info_inner, vector_data_inner, ProxyReply};

const INDEX_TEMPLATE: &str = include_str!("../assets/index.html");

#[derive(Debug, Default, Deserialize)]
pub struct LookupForm {
    #[serde(rename = "productId", default)]
    pub product_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct VectorForm {
    #[serde(rename = "vectorId", default)]
    pub vector_id: String,
    #[serde(rename = "latestN", default)]
    pub latest_n: String,
}

/// Values substituted into the page template. Form values are escaped here;
/// result fragments arrive already rendered.
#[derive(Debug, Default)]
pub struct Page {
    pub product_id: String,
    pub vector_id: String,
    pub latest_n: String,
    pub lookup_result: String,
    pub vector_result: String,
}

impl Page {
    pub fn render(&self) -> String {
        fill_template(INDEX_TEMPLATE, |key| match key {
            "product_id" => Some(escape_html(&self.product_id)),
            "vector_id" => Some(escape_html(&self.vector_id)),
            "latest_n" => Some(escape_html(&self.latest_n)),
            "lookup_result" => Some(self.lookup_result.clone()),
            "vector_result" => Some(self.vector_result.clone()),
            _ => None,
        })
    }
}

/// Single pass over `{{key}}` placeholders; substituted text is never rescanned.
fn fill_template(template: &str, value_for: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match value_for(key) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn ok_body(reply: &ProxyReply) -> Option<&Value> {
    if reply.status() == StatusCode::OK {
        reply.body()
    } else {
        None
    }
}

// ============================================================================
// Inner (directly testable) fragment builders
// ============================================================================

/// Lookup result fragment: vectors from the local table, then cube metadata.
pub async fn lookup_fragment(state: &HttpState, product_id: &str) -> String {
    let product_id = product_id.trim();
    let mut html = render_vectors(state.lookup.find_raw(product_id));

    let body = json!([{ "productId": product_id }]).to_string();
    let reply = cube_metadata_inner(&state.wds, &Method::POST, body.as_bytes()).await;
    match ok_body(&reply) {
        Some(meta) => html.push_str(&render_cube_metadata(meta)),
        None => tracing::debug!(status = %reply.status(), "Cube metadata unavailable for lookup page"),
    }

    html
}

/// Vector result fragment: data point table, then series info.
pub async fn vector_fragment(state: &HttpState, vector_id: &str, latest_n: &str) -> String {
    let vector_id = vector_id.trim();
    let latest_n = latest_n.trim();
    let latest_n = if latest_n.is_empty() {
        Value::Null
    } else {
        Value::String(latest_n.to_string())
    };

    let body = json!([{ "vectorId": vector_id, "latestN": latest_n }]).to_string();
    let reply = vector_data_inner(&state.wds, &Method::POST, body.as_bytes()).await;
    let Some(data) = ok_body(&reply) else {
        let detail = reply.body().map(Value::to_string).unwrap_or_default();
        return render_error(&format!(
            "Request failed {}: {}",
            reply.status().as_u16(),
            detail
        ));
    };
    let mut html = render_vector_data(data);

    let body = json!([{ "vectorId": vector_id }]).to_string();
    let reply = series_info_inner(&state.wds, &Method::POST, body.as_bytes()).await;
    match ok_body(&reply) {
        Some(info) => html.push_str(&render_series_info(info)),
        None => tracing::debug!(status = %reply.status(), "Series info unavailable for vector page"),
    }

    html
}

// ============================================================================
// Axum handlers
// ============================================================================

pub async fn index_handler() -> Html<String> {
    Html(Page::default().render())
}

pub async fn lookup_handler(
    State(state): State<Arc<HttpState>>,
    Query(form): Query<LookupForm>,
) -> Html<String> {
    let lookup_result = lookup_fragment(&state, &form.product_id).await;
    Html(
        Page {
            product_id: form.product_id,
            lookup_result,
            ..Page::default()
        }
        .render(),
    )
}

pub async fn vector_handler(
    State(state): State<Arc<HttpState>>,
    Query(form): Query<VectorForm>,
) -> Html<String> {
    let vector_result = vector_fragment(&state, &form.vector_id, &form.latest_n).await;
    Html(
        Page {
            vector_id: form.vector_id,
            latest_n: form.latest_n,
            vector_result,
            ..Page::default()
        }
        .render(),
    )
}
