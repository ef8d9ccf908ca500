//! Ingestion pipeline configuration

use common::LensTag;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the quality pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Enable/disable ingestion
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Drop payloads that fail schema validation
    #[serde(default = "default_require_valid")]
    pub require_valid: bool,

    /// Minimum quality score for scored payloads
    #[serde(default)]
    pub min_score: f64,

    /// Maximum number of signals kept per batch
    #[serde(default = "default_max_signals_per_batch")]
    pub max_signals_per_batch: usize,

    /// Lenses admitted to the batch; empty admits every lens
    #[serde(default)]
    pub allowed_lenses: Vec<LensTag>,

    /// Load schema documents from here instead of the built-in set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_dir: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_valid: true,
            min_score: 0.0,
            max_signals_per_batch: 50,
            allowed_lenses: Vec::new(),
            schema_dir: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_require_valid() -> bool {
    true
}

fn default_max_signals_per_batch() -> usize {
    50
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: PipelineConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to TOML file
pub fn save_config(config: &PipelineConfig, path: &str) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Create a default configuration file template
pub fn create_config_template(path: &str) -> anyhow::Result<()> {
    let template = "# Signal Quality Pipeline Configuration

# Enable ingestion
enabled = true

# Drop payloads that fail schema validation
require_valid = true

# Minimum quality score for lens-scored payloads
min_score = 0.0

# Maximum number of signals kept per batch
max_signals_per_batch = 50

# Lenses admitted to the batch (empty admits all)
# Options: equity, strategy, macro, onchain, generic
allowed_lenses = []

# Directory of *.schema.json documents overriding the built-in set
# schema_dir = \"schemas\"
";

    std::fs::write(path, template)?;
    Ok(())
}
