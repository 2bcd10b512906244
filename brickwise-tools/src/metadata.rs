//! Building metadata index.
//!
//! The backing file maps building short codes to records carrying at
//! least a `location`. It is read exactly once per process through a
//! single-flight cell; concurrent first-loads converge on the same
//! content. A missing or malformed file is a fatal configuration
//! error, not something a run can recover from.

use brickwise_core::{BrickError, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

#[derive(Debug, Clone, Deserialize)]
pub struct BuildingRecord {
    pub location: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Single-flight cached building-code → location mapping.
pub struct MetadataIndex {
    path: PathBuf,
    cache: OnceCell<BTreeMap<String, BuildingRecord>>,
}

impl MetadataIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), cache: OnceCell::new() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn records(&self) -> Result<&BTreeMap<String, BuildingRecord>> {
        self.cache
            .get_or_try_init(|| async {
                let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
                    BrickError::Config(format!(
                        "metadata file not found: {}: {e}",
                        self.path.display()
                    ))
                })?;
                let records: BTreeMap<String, BuildingRecord> = serde_json::from_str(&content)
                    .map_err(|e| {
                        BrickError::Config(format!(
                            "malformed metadata file {}: {e}",
                            self.path.display()
                        ))
                    })?;
                tracing::debug!(buildings = records.len(), "loaded building metadata");
                Ok(records)
            })
            .await
    }

    /// Building code → location, sorted by code.
    pub async fn locations(&self) -> Result<BTreeMap<String, String>> {
        let records = self.records().await?;
        Ok(records.iter().map(|(code, r)| (code.clone(), r.location.clone())).collect())
    }

    /// Location for one building code, if known.
    pub async fn location_of(&self, code: &str) -> Result<Option<String>> {
        let records = self.records().await?;
        Ok(records.get(code).map(|r| r.location.clone()))
    }

    /// The summary message appended by the metadata-resolution node.
    pub async fn summary(&self) -> Result<String> {
        let locations = self.locations().await?;
        let rendered = serde_json::to_string_pretty(&json!(locations))?;
        Ok(format!("Available buildings and locations: {rendered}"))
    }
}
