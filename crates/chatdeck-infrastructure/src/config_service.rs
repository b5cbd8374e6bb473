//! Configuration service implementation.
//!
//! Loads `ChatConfig` from `config.toml` (~/.config/chatdeck/config.toml by
//! default) and caches it. A missing file yields the defaults.

use crate::paths::ChatdeckPaths;
use chatdeck_core::config::ChatConfig;
use chatdeck_core::error::{ChatError, Result};
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

/// Environment variable overriding `api_base_url`.
pub const API_BASE_URL_ENV: &str = "CHATDECK_API_BASE_URL";

/// Configuration service that loads and caches the chat configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    /// Explicit config file; the platform default when `None`.
    path: Option<PathBuf>,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<ChatConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the platform config file.
    ///
    /// Nothing is read until the first `get_config`.
    pub fn new() -> Self {
        Self {
            path: None,
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Creates a service reading `path` instead of the platform file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A file that cannot be read or parsed is logged and replaced by the
    /// defaults (with environment overrides still applied).
    pub fn get_config(&self) -> ChatConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load_config().unwrap_or_else(|err| {
            tracing::warn!("[ConfigService] Falling back to default config: {}", err);
            apply_env_overrides(ChatConfig::default(), env_lookup)
        });

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(loaded.clone());
        loaded
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    /// Reads the config file, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Config` when the path cannot be resolved or the
    /// file cannot be read, `ChatError::Serialization` when it is not valid
    /// TOML for `ChatConfig`.
    pub fn load_config(&self) -> Result<ChatConfig> {
        let path = self.config_path()?;
        let config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let parsed: ChatConfig = toml::from_str(&content)?;
            tracing::debug!("[ConfigService] Loaded config from {}", path.display());
            parsed
        } else {
            tracing::debug!(
                "[ConfigService] No config at {}, using defaults",
                path.display()
            );
            ChatConfig::default()
        };
        Ok(apply_env_overrides(config, env_lookup))
    }

    /// Writes `config` to the config file and refreshes the cache.
    ///
    /// Parent directories are created as needed.
    pub fn save_config(&self, config: &ChatConfig) -> Result<()> {
        let path = self.config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        std::fs::write(&path, content)?;
        tracing::info!("[ConfigService] Saved config to {}", path.display());

        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = Some(config.clone());
        Ok(())
    }

    /// Path of the config file this service reads.
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => ChatdeckPaths::config_file().map_err(|e| ChatError::config(e.to_string())),
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn apply_env_overrides(mut config: ChatConfig, lookup: impl Fn(&str) -> Option<String>) -> ChatConfig {
    if let Some(url) = lookup(API_BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
        config.api_base_url = url.trim().to_string();
    }
    config
}
