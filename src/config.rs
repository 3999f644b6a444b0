use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::artwork::DEFAULT_CACHE_DIR;
use crate::theme::Theme;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub icon_theme: Theme,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            icon_theme: Theme::default(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl AppConfig {
    pub fn get_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("medley");
        std::fs::create_dir_all(&path).ok();
        path.push("config.toml");
        path
    }

    pub fn load() -> Self {
        let path = Self::get_config_path();
        if path.exists() {
            if let Ok(content) = fs::read_to_string(&path) {
                match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(err) => warn!(%err, "ignoring malformed config"),
                }
            }
        }
        Self::default()
    }

    pub fn save(&self) {
        let path = Self::get_config_path();
        if let Ok(content) = toml::to_string_pretty(self) {
            let _ = fs::write(path, content);
        }
    }

    /// Where the rolling log files live, next to the thumbnail cache.
    pub fn log_dir(&self) -> PathBuf {
        self.cache_dir
            .parent()
            .map(|parent| parent.join("logs"))
            .unwrap_or_else(|| self.cache_dir.join("logs"))
    }
}
