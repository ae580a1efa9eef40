//! Engine configuration.
//!
//! The configuration file supplies the values used when a tag leaves an
//! argument empty. It is optional; a missing file means built-in defaults.
//!
//! # Location
//!
//! - Explicit path passed to [`EngineConfig::load_with_optional`] (CLI `--config`)
//! - `RESPONSE_REGEX_CONFIG` environment variable
//! - `<config dir>/response-regex/config.toml` (e.g. `~/.config/response-regex/config.toml`)
//!
//! # File Format
//!
//! ```toml
//! # Used when the tag has no trigger behavior set
//! trigger_behavior = "when-expired"
//!
//! # Used when the tag has no max age set
//! max_age_seconds = 300
//! ```

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::constants::{CONFIG_PATH_ENV, DEFAULT_MAX_AGE_SECONDS, LOG_TARGET};
use crate::policy::TriggerBehavior;

/// Defaults applied to tag arguments the user left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Trigger behavior for tags without one.
    pub trigger_behavior: TriggerBehavior,

    /// Max age in seconds for tags without one. Must be positive.
    pub max_age_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trigger_behavior: TriggerBehavior::Never,
            max_age_seconds: DEFAULT_MAX_AGE_SECONDS,
        }
    }
}

impl EngineConfig {
    /// Load from `path` if given, otherwise from the default location.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or
    /// validated.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    debug!(target: LOG_TARGET, "No configuration directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            debug!(target: LOG_TARGET, path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML, or
    /// fails [`validate`](Self::validate).
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(config)
    }

    /// Write the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Default config file location, honouring `RESPONSE_REGEX_CONFIG`.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("response-regex").join("config.toml"))
    }

    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_age_seconds` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.max_age_seconds == 0 {
            bail!("max_age_seconds must be greater than zero");
        }
        Ok(())
    }
}
