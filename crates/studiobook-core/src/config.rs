//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the script endpoint URLs and the sync timing knobs.
//!
//! Configuration is stored at `~/.config/studiobook/config.json`. The
//! `STUDIOBOOK_ENDPOINT_URL`, `STUDIOBOOK_SCHEDULE_URL` and
//! `STUDIOBOOK_REFRESH_SECS` environment variables take precedence.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "studiobook";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const ENV_ENDPOINT_URL: &str = "STUDIOBOOK_ENDPOINT_URL";
const ENV_SCHEDULE_URL: &str = "STUDIOBOOK_SCHEDULE_URL";
const ENV_REFRESH_SECS: &str = "STUDIOBOOK_REFRESH_SECS";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Script URL answering `getBookedEvents` and `checkDate`
    pub endpoint_url: Option<String>,
    /// Script URL answering `getData`; defaults to `endpoint_url`
    pub schedule_url: Option<String>,
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Timing of the background sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub refresh_interval_secs: u64,
    pub fetch_timeout_secs: u64,
    pub retry_delay_secs: u64,
    pub max_retries: u32,
    pub schedule_refresh_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: 30,
            fetch_timeout_secs: 7,
            retry_delay_secs: 4,
            max_retries: 3,
            schedule_refresh_secs: 30,
        }
    }
}

impl SyncSettings {
    pub fn refresh_interval(&self) -> Duration {
        // A zero period would make tokio's interval panic
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn fetch_timeout(&self) -> Duration {
        // A zero deadline would abort every fetch before it starts
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn schedule_refresh(&self) -> Duration {
        Duration::from_secs(self.schedule_refresh_secs.max(1))
    }
}

impl Config {
    /// Load the config file (defaults if absent), then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// The config file alone, without environment overrides. Edit this one
    /// before calling `save`, so overrides never end up on disk.
    pub fn load_file() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_ENDPOINT_URL).filter(|v| !v.trim().is_empty()) {
            self.endpoint_url = Some(url);
        }
        if let Some(url) = lookup(ENV_SCHEDULE_URL).filter(|v| !v.trim().is_empty()) {
            self.schedule_url = Some(url);
        }
        if let Some(secs) = lookup(ENV_REFRESH_SECS) {
            match secs.trim().parse() {
                Ok(secs) => self.sync.refresh_interval_secs = secs,
                Err(_) => warn!(value = %secs, "Ignoring invalid {}", ENV_REFRESH_SECS),
            }
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Booked-events endpoint, required for anything that talks to the sheet
    pub fn endpoint(&self) -> Result<&str> {
        self.endpoint_url.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "No endpoint configured. Set {} or add \"endpoint_url\" to {}",
                ENV_ENDPOINT_URL,
                Self::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| CONFIG_FILE.to_string())
            )
        })
    }

    pub fn schedule_endpoint(&self) -> Option<&str> {
        self.schedule_url.as_deref().or(self.endpoint_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = SyncSettings::default();
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(7));
        assert_eq!(settings.retry_delay(), Duration::from_secs(4));
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_sync_section_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"endpoint_url":"https://example.invalid/exec","sync":{"refresh_interval_secs":5}}"#,
        )
        .unwrap();
        assert_eq!(config.sync.refresh_interval_secs, 5);
        assert_eq!(config.sync.fetch_timeout_secs, 7);
        assert_eq!(config.schedule_endpoint(), Some("https://example.invalid/exec"));
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let settings = SyncSettings {
            refresh_interval_secs: 0,
            ..SyncSettings::default()
        };
        assert_eq!(settings.refresh_interval(), Duration::from_secs(1));

        let settings = SyncSettings {
            fetch_timeout_secs: 0,
            ..SyncSettings::default()
        };
        assert_eq!(settings.fetch_timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_ENDPOINT_URL, "https://example.invalid/booked"),
            (ENV_SCHEDULE_URL, "https://example.invalid/schedule"),
            (ENV_REFRESH_SECS, "12"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.endpoint().unwrap(), "https://example.invalid/booked");
        assert_eq!(config.schedule_endpoint(), Some("https://example.invalid/schedule"));
        assert_eq!(config.sync.refresh_interval_secs, 12);
    }

    #[test]
    fn test_invalid_refresh_override_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == ENV_REFRESH_SECS).then(|| "soon".to_string()));
        assert_eq!(config.sync.refresh_interval_secs, 30);
        assert!(config.endpoint().is_err());
    }

    #[test]
    fn test_saved_file_excludes_env_overrides() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("studiobook").join(CONFIG_FILE);
        Config::default().save_to(&path).unwrap();

        let env: HashMap<&str, &str> = [
            (ENV_SCHEDULE_URL, "https://example.invalid/env-schedule"),
            (ENV_REFRESH_SECS, "1"),
        ]
        .into_iter()
        .collect();
        let mut effective = Config::load_from(&path).unwrap();
        effective.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(effective.sync.refresh_interval_secs, 1);

        // Edits go through the file-only config
        let mut on_disk = Config::load_from(&path).unwrap();
        on_disk.endpoint_url = Some("https://example.invalid/exec".to_string());
        on_disk.save_to(&path).unwrap();

        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(!saved.contains("env-schedule"));
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.endpoint_url.as_deref(), Some("https://example.invalid/exec"));
        assert_eq!(reloaded.schedule_url, None);
        assert_eq!(reloaded.sync.refresh_interval_secs, 30);
    }
}
