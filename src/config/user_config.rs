//! User-level configuration for pkgrisk
//!
//! Supports loading the analytics API key from:
//! - Environment variables
//! - ~/.config/pkgrisk/config.toml
//! - a legacy `openhub_key.txt` in the working directory

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const API_KEY_ENV: &str = "OPENHUB_API_KEY";
pub const LEGACY_KEY_FILE: &str = "openhub_key.txt";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub openhub: OpenHubConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenHubConfig {
    /// OpenHub API key; without one only cached project data is used
    pub api_key: Option<String>,
}

impl UserConfig {
    /// Load config from all sources, with priority:
    /// 1. Environment variables (highest)
    /// 2. User config (~/.config/pkgrisk/config.toml)
    /// 3. `openhub_key.txt` in the working directory
    pub fn load(workdir: &Path) -> Result<Self> {
        let mut config = UserConfig::default();

        if let Some(key) = read_legacy_key(&workdir.join(LEGACY_KEY_FILE)) {
            debug!("Using API key from {}", LEGACY_KEY_FILE);
            config.openhub.api_key = Some(key);
        }

        if let Some(user_config) = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|content| toml::from_str::<UserConfig>(&content).ok())
        {
            config.merge(user_config);
        }

        // Environment variables override everything
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            config.openhub.api_key = Some(key);
        }

        config.openhub.api_key = config
            .openhub
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Ok(config)
    }

    /// Get the user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pkgrisk").join("config.toml"))
    }

    /// Merge another config into this one (other takes priority)
    fn merge(&mut self, other: UserConfig) {
        if other.openhub.api_key.is_some() {
            self.openhub.api_key = other.openhub.api_key;
        }
    }

    pub fn api_key(&self) -> Option<&str> {
        self.openhub.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.openhub.api_key.is_some()
    }

    /// Initialize user config directory and create example config
    pub fn init_user_config() -> Result<PathBuf> {
        let config_path = Self::user_config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if !config_path.exists() {
            let example = r#"# pkgrisk User Configuration

[openhub]
# Register an application at https://www.openhub.net/accounts/me/api_keys
# Without a key only project data already in the cache is used.
# api_key = "..."
"#;
            std::fs::write(&config_path, example)?;
        }

        Ok(config_path)
    }
}

/// First line of the legacy key file, if present and non-blank.
fn read_legacy_key(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let key = content.lines().next()?.trim();
    (!key.is_empty()).then(|| key.to_string())
}
