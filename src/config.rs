// Configuration management for jellyfin-rs
// Loads config.toml from the user's config dir, writing defaults on first run

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::audio::RepeatMode;

const APP_DIR: &str = "jellyfin-rs";
const CONFIG_FILE: &str = "config.toml";
const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Client name reported to the server in the authorization header
    pub client_name: String,
    pub device_name: String,
    pub device_id: String,
    pub request_timeout_secs: u64,
    pub repeat_mode: RepeatMode,
    pub credentials_path: PathBuf,
    /// Pause before the library list is requested after login
    pub library_load_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            client_name: "jellyfin-rs".to_string(),
            device_id: format!("jellyfin-rs-{}", host),
            device_name: host,
            request_timeout_secs: 30,
            repeat_mode: RepeatMode::All,
            credentials_path: data_dir.join(CREDENTIALS_FILE),
            library_load_delay_ms: 0,
        }
    }
}

impl AppConfig {
    /// Load from `path`, or from the default location when `path` is `None`.
    /// A missing file is created with defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "Loaded config");
            Ok(config)
        } else {
            let config = AppConfig::default();
            config.save_to(&config_path)?;
            tracing::info!(path = %config_path.display(), "Wrote default config");
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn library_load_delay(&self) -> Duration {
        Duration::from_millis(self.library_load_delay_ms)
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join(APP_DIR);

        Ok(config_dir.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load(Some(&path)).unwrap();

        assert!(path.exists());
        assert_eq!(config.repeat_mode, RepeatMode::All);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "repeat_mode = \"off\"\nlibrary_load_delay_ms = 1500\n").unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.repeat_mode, RepeatMode::Off);
        assert_eq!(config.library_load_delay(), Duration::from_millis(1500));
        assert_eq!(config.client_name, "jellyfin-rs");
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let config = AppConfig {
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.request_timeout(), Duration::from_secs(1));
    }
}
