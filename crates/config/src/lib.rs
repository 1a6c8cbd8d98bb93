//! Settings for the schedule client.
//!
//! Loaded from `<config dir>/shiftgrid/config.toml` when present, then
//! overridden from the environment. Every field has a default, so a missing
//! file or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const API_URL_ENV: &str = "SHIFTGRID_API_URL";
pub const STORE_PATH_ENV: &str = "SHIFTGRID_STORE_PATH";

const PLACEHOLDER: &str = "YOUR_DEPLOYMENT_ID";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    /// Deployed backend endpoint.
    pub api_url: String,
    pub timeout_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            timeout_ms: 30_000,
            retry_attempts: 2,
            retry_delay_ms: 1_000,
        }
    }
}

impl RemoteSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn is_configured(&self) -> bool {
        let url = self.api_url.trim();
        !url.is_empty() && !url.contains(PLACEHOLDER)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// SQLite file holding the persisted edit session. `None` means the
    /// default location under the user data dir.
    pub store_path: Option<PathBuf>,
}

impl SessionSettings {
    pub fn effective_store_path(&self) -> Option<PathBuf> {
        self.store_path
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("shiftgrid").join("session.db")))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub session: SessionSettings,
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("shiftgrid").join("config.toml"))
    }

    /// Load from the default location plus environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        settings.apply_overrides(|key| std::env::var(key).ok());
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let settings = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// [`Settings::load`]).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.remote.api_url = url;
        }
        if let Some(path) = lookup(STORE_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.session.store_path = Some(PathBuf::from(path));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.remote.is_configured() {
            return Err(ConfigError::Invalid(format!(
                "remote.api_url is not configured (set it in config.toml or {API_URL_ENV})"
            )));
        }
        Ok(())
    }
}
