//! Application settings and file locations.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::governor::{GovernorConfig, millis};
use crate::{Error, Result};

const APP_DIR: &str = "tempbox";
const SETTINGS_FILE: &str = "settings.json";

/// User-editable settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the mail API.
    pub api_base_url: String,
    /// Period of the automatic inbox poll.
    #[serde(with = "millis", rename = "refresh_interval_ms")]
    pub refresh_interval: Duration,
    /// Request pacing for every mailbox session.
    pub governor: GovernorConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: tempbox_api::DEFAULT_BASE_URL.to_string(),
            refresh_interval: Duration::from_secs(120),
            governor: GovernorConfig::default(),
        }
    }
}

impl Settings {
    /// Default settings file: `<config dir>/tempbox/settings.json`.
    #[must_use]
    pub fn default_path() -> PathBuf {
        config_dir().join(SETTINGS_FILE)
    }

    /// Loads settings, falling back to defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = tokio::fs::read_to_string(path).await?;
        let settings: Self = serde_json::from_str(&contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Saves settings as pretty JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;

        info!("Settings saved to {:?}", path);
        Ok(())
    }

    /// Checks values that would make polling misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(Error::Config("refresh_interval_ms must be positive".to_string()));
        }
        if self.governor.initial_delay > self.governor.max_delay {
            return Err(Error::Config(
                "governor.initial_delay_ms must not exceed governor.max_delay_ms".to_string(),
            ));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| Error::Config(format!("api_base_url: {e}")))?;
        Ok(())
    }
}

/// Directory for settings: `<config dir>/tempbox`.
#[must_use]
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Directory for session and account files: `<data dir>/tempbox`.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
