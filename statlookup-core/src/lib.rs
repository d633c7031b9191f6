pub mod config;
pub mod error;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod records;
pub mod render;
pub mod wds;

pub use config::StatConfig;
pub use error::StatError;
pub use lookup::LookupTable;
pub use models::{
    CubeMetadataRequest, ProductLookupEntry, SeriesInfoRequest, VectorRef, VectorRequest,
};
pub use normalize::{
    clamp_latest_n, normalize_product_id, normalize_vector_id, split_vector_ids, value_text,
    parse_latest_n, parse_product_id, parse_vector_id, DEFAULT_LATEST_N, MAX_LATEST_N,
    MIN_LATEST_N,
};
pub use wds::{WdsClient, WdsError, WdsReply, DEFAULT_WDS_BASE_URL};
