//! Configuration management for the badge calculator

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub parallelism: f64,
    pub primary_label: String,
    pub secondary_label: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: None,
            parallelism: 1.0,
            primary_label: "Gold".to_string(),
            secondary_label: "Gems".to_string(),
        }
    }
}

impl Config {
    /// Get the default path to the config file
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("badge-calculator");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from a file, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Database path, falling back to the working directory
    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from("badge_data.db"))
    }
}
