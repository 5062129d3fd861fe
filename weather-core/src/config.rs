use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{
    format::DEFAULT_ICON_BASE_URL, model::Coordinates, provider::openweather::DEFAULT_BASE_URL,
};

/// Environment variable that overrides the API key from the config file.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

pub const DEFAULT_CONNECTIVITY_TIMEOUT_MS: u64 = 1500;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// connectivity_timeout_ms = 1500
///
/// [default_location]
/// latitude = 51.5074
/// longitude = -0.1278
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Directory holding the `weather` and `forecast` endpoints.
    pub api_base_url: Option<String>,

    pub icon_base_url: Option<String>,

    /// Where the offline snapshot lives; defaults to the platform data dir.
    pub snapshot_path: Option<PathBuf>,

    pub connectivity_timeout_ms: Option<u64>,

    /// Used by `weather here` when no coordinates are given.
    pub default_location: Option<Coordinates>,
}

impl Config {
    /// The configured API key, or an error with a hint on how to set one.
    pub fn api_key(&self) -> Result<String> {
        self.api_key
            .as_ref()
            .filter(|k| !k.trim().is_empty())
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `weather configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn api_base_url(&self) -> &str {
        self.api_base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn icon_base_url(&self) -> &str {
        self.icon_base_url.as_deref().unwrap_or(DEFAULT_ICON_BASE_URL)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_millis(
            self.connectivity_timeout_ms
                .unwrap_or(DEFAULT_CONNECTIVITY_TIMEOUT_MS),
        )
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    /// `OPENWEATHER_API_KEY` takes precedence over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.override_api_key(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    /// Replace the stored key with `key`, unless it is absent or blank.
    pub fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the snapshot database.
    pub fn snapshot_file_path(&self) -> Result<PathBuf> {
        match &self.snapshot_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("snapshot.db")),
        }
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weather-task", "weather-cli")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}
