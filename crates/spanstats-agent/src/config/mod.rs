//! Agent config loader (strict parsing) and environment resolution.

pub mod schema;
pub mod settings;

use std::fs;
use std::path::Path;

use spanstats_core::error::{Result, StatsError};

pub use schema::{
    AgentConfig, DriverSection, ExporterSection, OpsSection, SamplerConfig, SinkConfig,
    TraceSection,
};
pub use settings::{DatabaseId, Settings};

/// Env var naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "SPANSTATS_CONFIG";
/// File picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "spanstats.yaml";

pub fn load_from_file(path: &str) -> Result<AgentConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatsError::BadConfig(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<AgentConfig> {
    let cfg: AgentConfig = serde_yaml::from_str(s)
        .map_err(|e| StatsError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Explicit path from `SPANSTATS_CONFIG`, else `spanstats.yaml` if it exists,
/// else built-in defaults.
pub fn load_default() -> Result<AgentConfig> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return load_from_file(&path);
    }
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        return load_from_file(DEFAULT_CONFIG_FILE);
    }
    let cfg = AgentConfig::default();
    cfg.validate()?;
    Ok(cfg)
}
