use serde::{Deserialize, Serialize};

/// One row of the local lookup file (`data.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLookupEntry {
    pub product_id: u64,
    pub description: String,
    #[serde(default)]
    pub vectors: Vec<VectorRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorRef {
    /// Kept as written in the file, usually with the `v` prefix.
    pub vector_id: String,
    #[serde(default)]
    pub text: String,
}

/// Body element for `getDataFromVectorsAndLatestNPeriods`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorRequest {
    pub vector_id: u64,
    pub latest_n: u32,
}

/// Body element for `getSeriesInfoFromVector`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInfoRequest {
    pub vector_id: u64,
}

/// Body element for `getCubeMetadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CubeMetadataRequest {
    pub product_id: u64,
}
