use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::scorer::ScorerConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub classifier_url: String,
    pub log_url: String,
    pub time_window_ms: u64,
    pub spam_threshold: usize,
    #[serde(default)]
    pub scorer: ScorerConfig,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier_url: "http://localhost:5000/demo-predict".to_string(),
            log_url: "http://localhost:5000/append-csv".to_string(),
            time_window_ms: 3000,
            spam_threshold: 5,
            scorer: ScorerConfig::default(),
        }
    }
}
