//! WDS client — thin wrapper over the Statistics Canada Web Data Service REST API
//!
//! Every call is a single JSON POST to one fixed endpoint. The reply body is
//! passed through as raw JSON together with the upstream status so callers can
//! relay it unchanged. There is no retry: a failed call is the caller's answer.

use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::models::{CubeMetadataRequest, SeriesInfoRequest, VectorRequest};

/// Production WDS REST root.
pub const DEFAULT_WDS_BASE_URL: &str = "https://www150.statcan.gc.ca/t1/wds/rest";

pub const CUBE_METADATA_ENDPOINT: &str = "getCubeMetadata";
pub const VECTOR_DATA_ENDPOINT: &str = "getDataFromVectorsAndLatestNPeriods";
pub const SERIES_INFO_ENDPOINT: &str = "getSeriesInfoFromVector";

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum WdsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid JSON from WDS (HTTP {status}): {source}")]
    InvalidJson {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

/// Upstream answer: the HTTP status WDS returned and its JSON body, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct WdsReply {
    pub status: u16,
    pub body: Value,
}

impl WdsReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// WdsClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct WdsClient {
    client: Client,
    base_url: String,
}

impl WdsClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, WdsError> {
        Self::with_base_url(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Create a client against a custom base URL (for testing / staging mirrors)
    pub fn with_base_url(base_url: String, timeout: Duration) -> Result<Self, WdsError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_cube_metadata(
        &self,
        payload: &[CubeMetadataRequest],
    ) -> Result<WdsReply, WdsError> {
        self.post(CUBE_METADATA_ENDPOINT, payload).await
    }

    pub async fn get_data_from_vectors(
        &self,
        payload: &[VectorRequest],
    ) -> Result<WdsReply, WdsError> {
        self.post(VECTOR_DATA_ENDPOINT, payload).await
    }

    pub async fn get_series_info(
        &self,
        payload: &[SeriesInfoRequest],
    ) -> Result<WdsReply, WdsError> {
        self.post(SERIES_INFO_ENDPOINT, payload).await
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &T,
    ) -> Result<WdsReply, WdsError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(url = %url, "WDS request");

        let response = self.client.post(&url).json(payload).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        let body: Value = serde_json::from_str(&text).map_err(|source| {
            tracing::error!(endpoint, status, "WDS returned a non-JSON body");
            WdsError::InvalidJson { status, source }
        })?;

        if !(200..300).contains(&status) {
            tracing::warn!(endpoint, status, "WDS returned an error status");
        }

        Ok(WdsReply { status, body })
    }
}

// ============================================================================
// TESTS
// ============================================================================
