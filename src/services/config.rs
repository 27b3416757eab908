//! User configuration stored at `~/.penguin-metrics/config.json`

use crate::services::data_fetcher::DEFAULT_POINT_QUERY_THRESHOLD;
use crate::types::{Granularity, PenguinError, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Id sets at or below this size are fetched with point queries
    pub point_query_threshold: usize,
    pub default_granularity: Granularity,
    pub moving_average_window: usize,
    pub percentiles: Vec<u32>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            point_query_threshold: DEFAULT_POINT_QUERY_THRESHOLD,
            default_granularity: Granularity::Day,
            moving_average_window: 7,
            percentiles: vec![50, 90, 95, 99],
        }
    }
}

impl MetricsConfig {
    /// Default location, `None` when the home directory is unknown
    pub fn default_path() -> Option<PathBuf> {
        BaseDirs::new().map(|d| d.home_dir().join(".penguin-metrics").join("config.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                debug!("home directory unavailable, using default config");
                Ok(Self::default())
            }
        }
    }

    /// A missing file yields defaults; an unreadable or invalid file is an error
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: MetricsConfig = serde_json::from_str(&content)
            .map_err(|e| PenguinError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.moving_average_window == 0 {
            return Err(PenguinError::Config(
                "moving_average_window must be at least 1".into(),
            ));
        }
        if let Some(p) = self.percentiles.iter().find(|&&p| p > 100) {
            return Err(PenguinError::Config(format!(
                "percentile {} is outside 0..=100",
                p
            )));
        }
        Ok(())
    }
}
