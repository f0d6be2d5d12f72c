//! Daemon Configuration
//!
//! Gathers the per-crate config structs into one pipeline configuration,
//! layered from an optional TOML file and `COILSCAN_*` environment
//! variables.

use datagram_capture::CaptureConfig;
use measurement_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use storage::StorageConfig;

/// Complete pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// UDP transport settings
    pub capture: CaptureConfig,
    /// Consumer loop settings
    pub engine: EngineConfig,
    /// Measurement file settings
    pub storage: StorageConfig,
}

/// Load the pipeline configuration.
///
/// Values come from the TOML file (when given) overlaid with `COILSCAN_*`
/// environment variables (`COILSCAN_STORAGE__PATH`, ...); anything left
/// unset falls back to the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PipelineConfig> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }
    let settings = builder
        .add_source(config::Environment::with_prefix("COILSCAN").separator("__"))
        .build()?;
    Ok(settings.try_deserialize()?)
}
