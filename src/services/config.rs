// src/services/config.rs
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::HeatmapError;
use crate::models::EventMarker;
use crate::services::aggregator::{default_event_markers, SignificanceRules, LARGE_DROP_THRESHOLD};
use crate::services::loader::DataSource;

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_DATA_PATH: &str = "data/nifty_returns.json";
pub const DEFAULT_CONFIG_PATH: &str = "config/heatmap.json";

fn default_threshold() -> f64 {
    LARGE_DROP_THRESHOLD
}

fn default_recent_cutoff() -> i32 {
    2020
}

fn default_crisis_years() -> Vec<i32> {
    vec![2008, 2020]
}

/// Tunables for significance flagging and the year filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapConfig {
    #[serde(default = "default_threshold")]
    pub large_drop_threshold: f64,
    #[serde(default = "default_event_markers")]
    pub event_markers: Vec<EventMarker>,
    #[serde(default = "default_recent_cutoff")]
    pub recent_cutoff: i32,
    #[serde(default = "default_crisis_years")]
    pub crisis_years: Vec<i32>,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        HeatmapConfig {
            large_drop_threshold: default_threshold(),
            event_markers: default_event_markers(),
            recent_cutoff: default_recent_cutoff(),
            crisis_years: default_crisis_years(),
        }
    }
}

impl HeatmapConfig {
    /// Reads the config file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HeatmapError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Config file {} not found, using defaults", path.display());
                return Ok(HeatmapConfig::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: HeatmapConfig = serde_json::from_str(&contents).map_err(|e| {
            HeatmapError::ParseFailure(format!("invalid config {}: {}", path.display(), e))
        })?;
        info!(
            "Loaded config from {} with {} event markers",
            path.display(),
            config.event_markers.len()
        );
        Ok(config)
    }

    pub fn significance_rules(&self) -> SignificanceRules {
        SignificanceRules::new(self.large_drop_threshold, self.event_markers.clone())
    }
}

/// Process-level settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_source: DataSource,
    pub config_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self, HeatmapError> {
        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| {
                    HeatmapError::ParseFailure(format!("PORT must be a number, got '{}'", raw))
                })?,
            Err(_) => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let data = env::var("HEATMAP_DATA").unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
        let config_path =
            env::var("HEATMAP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        Ok(Settings {
            port,
            data_source: DataSource::parse(&data),
            config_path: PathBuf::from(config_path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Month;

    #[test]
    fn partial_config_fills_defaults() {
        let config: HeatmapConfig = serde_json::from_str(r#"{"recent_cutoff": 2018}"#).unwrap();
        assert_eq!(config.recent_cutoff, 2018);
        assert_eq!(config.crisis_years, vec![2008, 2020]);
        assert_eq!(config.large_drop_threshold, -15.0);
        assert_eq!(config.event_markers.len(), 2);
    }

    #[test]
    fn markers_are_read_from_json() {
        let config: HeatmapConfig = serde_json::from_str(
            r#"{"event_markers": [{"year": 2016, "month": "Nov", "label": "Demonetisation"}]}"#,
        )
        .unwrap();
        assert_eq!(
            config.event_markers,
            vec![EventMarker::new(2016, Month::Nov, "Demonetisation")]
        );
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let config = HeatmapConfig::load("does/not/exist/heatmap.json").unwrap();
        assert_eq!(config, HeatmapConfig::default());
    }

    #[test]
    fn bad_month_in_config_is_rejected() {
        let result: Result<HeatmapConfig, _> = serde_json::from_str(
            r#"{"event_markers": [{"year": 2016, "month": "November", "label": "x"}]}"#,
        );
        assert!(result.is_err());
    }
}
