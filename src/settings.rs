use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::feed::cache::FetchPolicy;
use crate::feed::window::DEFAULT_MAX_ITEMS;
use crate::playback::AutoplayPolicy;
use crate::session::SessionConfig;
use crate::theme::ThemeVariant;

const APP_SENTINEL: &str = "mediafeed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "_app")]
    pub app: String,

    /// Feed server, e.g. `http://127.0.0.1:5000`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// Cap on rendered items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_delay_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_muted: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoplay: Option<AutoplayPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeVariant>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: APP_SENTINEL.to_string(),
            api_base: None,
            max_items: None,
            retry_delay_ms: None,
            request_timeout_secs: None,
            start_muted: None,
            autoplay: None,
            theme: None,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize settings")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.app != APP_SENTINEL {
            bail!(
                "Settings file appears to belong to another application (expected _app = '{}', found '{}')",
                APP_SENTINEL,
                self.app
            );
        }
        if self.max_items == Some(0) {
            bail!("max_items must be at least 1");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Session tuning from the file; `max_items` from the command line wins.
    pub fn session_config(&self, max_items: Option<usize>) -> SessionConfig {
        let mut policy = FetchPolicy::default();
        if let Some(ms) = self.retry_delay_ms {
            policy = policy.with_retry_delay(Duration::from_millis(ms));
        }
        SessionConfig {
            max_items: max_items
                .or(self.max_items)
                .unwrap_or(DEFAULT_MAX_ITEMS),
            policy,
            start_muted: self.start_muted.unwrap_or(true),
        }
    }
}

pub fn config_dir(custom: Option<&PathBuf>) -> Option<PathBuf> {
    custom
        .cloned()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config").join("mediafeed")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn log_path(config_dir: &Path) -> PathBuf {
    config_dir.join("mediafeed.log")
}
