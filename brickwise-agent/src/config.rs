//! Assistant configuration.
//!
//! All settings are supplied at construction and never change mid-run.
//! Validation happens before the first run starts: a bad configuration
//! is a fatal error, never something a run discovers halfway through.

use brickwise_core::{BrickError, Result};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Path to the building metadata JSON file.
    pub metadata_file: PathBuf,
    /// Directory containing the per-building `bui_<CODE>.ttl` files.
    pub ttl_dir: PathBuf,
    /// Model identifier passed to the LLM collaborator.
    pub model: String,
    /// Row cap applied to query results without an explicit LIMIT.
    pub top_k: usize,
    /// SQL dialect name, used only to parametrize generation rules.
    pub dialect: String,
    /// Step ceiling per run.
    pub max_steps: usize,
}

impl AgentConfig {
    pub fn new(metadata_file: impl Into<PathBuf>, ttl_dir: impl Into<PathBuf>) -> Self {
        Self {
            metadata_file: metadata_file.into(),
            ttl_dir: ttl_dir.into(),
            model: "gpt-4o".to_string(),
            top_k: 5,
            dialect: "postgresql".to_string(),
            max_steps: 25,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Fail fast on anything that would make every run fail later.
    pub fn validate(&self) -> Result<()> {
        if !Path::new(&self.metadata_file).is_file() {
            return Err(BrickError::Config(format!(
                "metadata file not found: {}",
                self.metadata_file.display()
            )));
        }
        if !Path::new(&self.ttl_dir).is_dir() {
            return Err(BrickError::Config(format!(
                "TTL directory not found: {}",
                self.ttl_dir.display()
            )));
        }
        if self.model.is_empty() {
            return Err(BrickError::Config("model identifier must not be empty".to_string()));
        }
        if self.top_k == 0 {
            return Err(BrickError::Config("top_k must be at least 1".to_string()));
        }
        if self.max_steps == 0 {
            return Err(BrickError::Config("max_steps must be at least 1".to_string()));
        }
        Ok(())
    }
}
