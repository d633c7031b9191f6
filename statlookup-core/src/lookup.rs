use std::path::Path;

use crate::error::StatError;
use crate::models::ProductLookupEntry;
use crate::normalize::parse_product_id;

/// The local product → vectors table. Loaded once, never mutated.
#[derive(Debug, Clone, Default)]
pub struct LookupTable {
    entries: Vec<ProductLookupEntry>,
}

impl LookupTable {
    pub fn from_entries(entries: Vec<ProductLookupEntry>) -> Self {
        Self { entries }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, StatError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<ProductLookupEntry> =
            serde_json::from_str(&raw).map_err(|e| StatError::Lookup {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        tracing::info!(path = %path.display(), entries = entries.len(), "Loaded product lookup table");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[ProductLookupEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, product_id: u64) -> Option<&ProductLookupEntry> {
        self.entries.iter().find(|e| e.product_id == product_id)
    }

    /// Look up free-form user input such as `"18100004"` or `"18-10-0004"`.
    pub fn find_raw(&self, raw: &str) -> Option<&ProductLookupEntry> {
        parse_product_id(raw).and_then(|id| self.find(id))
    }
}
