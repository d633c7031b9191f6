use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::StatError;
use crate::wds::DEFAULT_WDS_BASE_URL;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StatConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "statlookup".to_string(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

/// Where the WDS REST API lives and how long a single call may take.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WDS_BASE_URL.to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    /// JSON array of product lookup entries, served as `/data.json`.
    pub lookup_path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            lookup_path: "data/data.json".to_string(),
        }
    }
}

impl StatConfig {
    /// Load from a TOML file (optional) layered under `STATLOOKUP_*` env vars,
    /// e.g. `STATLOOKUP_HTTP__PORT=9000`.
    pub fn load(path: &str) -> Result<Self, StatError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("STATLOOKUP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Ok(s.try_deserialize()?)
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}
