use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Converter settings read from an optional RON file. Anything omitted
/// falls back to the engine's built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub cdn_host: Option<String>,
    pub extension: Option<String>,
    pub asset_dir: Option<String>,
    pub asset_prefix: Option<String>,
    pub max_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub fetch_pause_ms: Option<u64>,
}

/// Loads the config file when one was given. A config the user asked for
/// but that cannot be read or parsed is an error, not a silent default.
pub fn load(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(path) = path else {
        return Ok(AppConfig::default());
    };
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    ron::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}
