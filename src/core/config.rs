use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::process_monitor::MetricKey;
use crate::error::{RamtreeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_refresh_interval_ms")]
    pub refresh_interval_ms: u64,
    #[serde(default = "default_enrich_cooldown_secs")]
    pub enrich_cooldown_secs: u64,
    #[serde(default = "default_enrich_batch_size")]
    pub enrich_batch_size: usize,
    #[serde(default = "default_enrich_pacing_ms")]
    pub enrich_pacing_ms: u64,
    #[serde(default = "default_enrich_enabled")]
    pub enrich_enabled: bool,
    #[serde(default = "default_timeline_capacity")]
    pub timeline_capacity: usize,
    #[serde(default)]
    pub default_sort: MetricKey,
    /// Directory for snapshot exports (current directory when unset)
    #[serde(default)]
    pub export_dir: Option<String>,
}

fn default_refresh_interval_ms() -> u64 {
    2000
}

fn default_enrich_cooldown_secs() -> u64 {
    10
}

fn default_enrich_batch_size() -> usize {
    5
}

fn default_enrich_pacing_ms() -> u64 {
    500
}

fn default_enrich_enabled() -> bool {
    true
}

fn default_timeline_capacity() -> usize {
    60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_ms: default_refresh_interval_ms(),
            enrich_cooldown_secs: default_enrich_cooldown_secs(),
            enrich_batch_size: default_enrich_batch_size(),
            enrich_pacing_ms: default_enrich_pacing_ms(),
            enrich_enabled: default_enrich_enabled(),
            timeline_capacity: default_timeline_capacity(),
            default_sort: MetricKey::default(),
            export_dir: None,
        }
    }
}

impl Config {
    /// Load from the user config directory, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path. A missing or empty file yields the
    /// defaults, and so does a file that no longer parses.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Config::default());
        }

        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable config {:?}: {}", path, e);
            Config::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| RamtreeError::config("Could not determine config directory"))?;

        Ok(config_dir.join("ramtree").join("config.json"))
    }

    /// Export directory, or the current directory when unset
    pub fn export_dir(&self) -> PathBuf {
        self.export_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"refresh_interval_ms": 750}"#).unwrap();
        assert_eq!(config.refresh_interval_ms, 750);
        assert_eq!(config.enrich_batch_size, 5);
        assert_eq!(config.default_sort, MetricKey::Rss);
    }

    #[test]
    fn test_sort_key_serialized_lowercase() {
        let config = Config {
            default_sort: MetricKey::Swap,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains(r#""default_sort":"swap""#));
    }
}
