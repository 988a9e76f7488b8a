//! User-wide settings (`~/.arca/config.toml`).
//!
//! ```toml
//! cache_dir = "~/.cache/arca"
//! max_parallel = 8
//! git_timeout_secs = 60
//! retry_attempts = 3
//! ```
//!
//! Every key is optional. `ARCA_CONFIG_PATH` points at a different file.
//! Credentials never live here; they come from the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_PARALLEL, DEFAULT_RETRY_ATTEMPTS, GIT_FETCH_TIMEOUT};
use crate::core::ArcaError;
use crate::utils::atomic_write;

/// Environment variable overriding the settings file location.
pub const CONFIG_PATH_ENV: &str = "ARCA_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Cache root; `~` and environment variables are expanded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,

    /// Upper bound on concurrent fetches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_parallel: Option<usize>,

    /// Timeout for a single git fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_timeout_secs: Option<u64>,

    /// Extra attempts for unreachable sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_attempts: Option<usize>,
}

impl GlobalSettings {
    /// Loads settings from [`global_config_path`]; a missing file yields
    /// defaults.
    pub fn load() -> Result<Self> {
        match global_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read global config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            ArcaError::ConfigParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize global config")?;
        atomic_write(path, content.as_bytes())
            .with_context(|| format!("Failed to write global config to {}", path.display()))
    }

    #[must_use]
    pub fn max_parallel(&self) -> usize {
        self.max_parallel.filter(|n| *n > 0).unwrap_or(DEFAULT_MAX_PARALLEL)
    }

    #[must_use]
    pub fn git_timeout(&self) -> Duration {
        self.git_timeout_secs.filter(|s| *s > 0).map_or(GIT_FETCH_TIMEOUT, Duration::from_secs)
    }

    #[must_use]
    pub fn retry_attempts(&self) -> usize {
        self.retry_attempts.unwrap_or(DEFAULT_RETRY_ATTEMPTS)
    }
}

/// `ARCA_CONFIG_PATH`, else `~/.arca/config.toml`. `None` only when no home
/// directory can be determined.
#[must_use]
pub fn global_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
        && !path.is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".arca").join("config.toml"))
}
