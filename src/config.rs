// Application configuration
//
// Read from ~/.config/tunestream/config.toml when it exists, then overridden
// by environment variables. Every field has a default so an empty (or
// missing) file is valid. Without a backend URL the app runs offline against
// the in-memory backend.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "tunestream";

const ENV_YOUTUBE_API_KEY: &str = "TUNESTREAM_YOUTUBE_API_KEY";
const ENV_BACKEND_URL: &str = "TUNESTREAM_BACKEND_URL";
const ENV_BACKEND_KEY: &str = "TUNESTREAM_BACKEND_KEY";
const ENV_LOG: &str = "TUNESTREAM_LOG";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub youtube: YouTubeConfig,
    pub backend: BackendConfig,
    pub search: SearchConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub base_url: String,
    // 10 is the "Music" category
    pub category_id: String,
    pub max_results: u32,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub min_query_len: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            youtube: YouTubeConfig::default(),
            backend: BackendConfig::default(),
            search: SearchConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        YouTubeConfig {
            api_key: String::new(),
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            category_id: "10".to_string(),
            max_results: 20,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig { min_query_len: 3 }
    }
}

impl AppConfig {
    // Config directory, e.g. ~/.config/tunestream
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join(APP_DIR_NAME);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory {}", dir.display()))?;
        Ok(dir)
    }

    // File first, then environment
    pub fn load(config_dir: &Path) -> Result<Self> {
        let mut config = Self::from_file(&config_dir.join("config.toml"))?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    // Takes a lookup function so tests don't have to touch the real env
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_YOUTUBE_API_KEY) {
            self.youtube.api_key = key;
        }
        if let Some(url) = lookup(ENV_BACKEND_URL) {
            self.backend.url = Some(url);
        }
        if let Some(key) = lookup(ENV_BACKEND_KEY) {
            self.backend.anon_key = key;
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        // An empty URL means "no backend", same as leaving it out
        if self.backend.url.as_deref().map(str::trim) == Some("") {
            self.backend.url = None;
        }
    }
}
