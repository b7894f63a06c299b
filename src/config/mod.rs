//! Configuration module

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::catalog::Catalog;
use crate::core::preview::PreviewSettings;
use crate::core::snippet::SnippetSyntax;

/// Directory holding local and global config
pub const CONFIG_DIR: &str = ".apiscope";

/// Overrides `api.token`
pub const TOKEN_ENV: &str = "APISCOPE_TOKEN";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub console: ConsoleConfig,

    #[serde(default)]
    pub preview: PreviewConfig,
}

/// Target API and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Replaces the catalog's base URL (e.g. a staging host)
    #[serde(default)]
    pub base_url: Option<String>,

    /// API token mirrored into `token` parameters
    #[serde(default)]
    pub token: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    60
}

/// Where the catalog document comes from
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Catalog JSON file; the bundled catalog when unset
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Console start-up state
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub default_api: Option<String>,

    #[serde(default)]
    pub default_endpoint: Option<String>,

    #[serde(default)]
    pub syntax: SnippetSyntax,
}

/// Response panel tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    #[serde(default = "default_initial_reveal")]
    pub initial_reveal: usize,

    #[serde(default = "default_reveal_step")]
    pub reveal_step: usize,

    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    #[serde(default = "default_near_bottom")]
    pub near_bottom: usize,

    #[serde(default = "default_csv_threshold")]
    pub csv_threshold_bytes: usize,

    /// Where CSV downloads are written; the Downloads folder when unset
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            initial_reveal: default_initial_reveal(),
            reveal_step: default_reveal_step(),
            debounce_ms: default_debounce_ms(),
            near_bottom: default_near_bottom(),
            csv_threshold_bytes: default_csv_threshold(),
            download_dir: None,
        }
    }
}

fn default_initial_reveal() -> usize {
    1000
}

fn default_reveal_step() -> usize {
    400
}

fn default_debounce_ms() -> u64 {
    20
}

fn default_near_bottom() -> usize {
    1500
}

fn default_csv_threshold() -> usize {
    5_800_000
}

impl PreviewConfig {
    pub fn settings(&self) -> PreviewSettings {
        PreviewSettings {
            initial_reveal: self.initial_reveal,
            reveal_step: self.reveal_step,
            debounce: Duration::from_millis(self.debounce_ms),
            near_bottom: self.near_bottom,
            csv_threshold_bytes: self.csv_threshold_bytes,
        }
    }
}

impl Config {
    /// Load config from default locations
    pub fn load() -> Result<Self> {
        // Try local config first, then global
        let mut config = if let Some(local) = Self::find_local_config() {
            Self::load_from(&local)?
        } else {
            match Self::global_config_path() {
                Some(global) if global.exists() => Self::load_from(&global)?,
                _ => Self::default(),
            }
        };

        config.apply_env();
        Ok(config)
    }

    /// Load from an explicit path when given, else from default locations
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let mut config = Self::load_from(path)?;
                config.apply_env();
                Ok(config)
            }
            None => Self::load(),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                self.api.token = token;
            }
        }
    }

    /// Find local .apiscope/config.toml walking up directories
    pub fn find_local_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;

        loop {
            let config_path = current.join(CONFIG_DIR).join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Get global config path (~/.apiscope/config.toml)
    pub fn global_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(CONFIG_DIR).join("config.toml"))
    }

    /// Load the catalog this config points at, with the base URL override
    /// applied. `path` takes precedence over `catalog.path`.
    pub fn load_catalog(&self, path: Option<&Path>) -> Result<Catalog> {
        let mut catalog = match path.or(self.catalog.path.as_deref()) {
            Some(path) => Catalog::load(path)?,
            None => Catalog::bundled().context("Bundled catalog is invalid")?,
        };

        if let Some(base_url) = &self.api.base_url {
            catalog.base_url = base_url.trim_end_matches('/').to_string();
        }
        Ok(catalog)
    }
}

/// User home directory
pub fn home_dir() -> Option<PathBuf> {
    directories::UserDirs::new().map(|u| u.home_dir().to_path_buf())
}
