//! Workspace configuration and on-disk state.
//!
//! A workspace owns two files at its root:
//!
//! - `.arca-assets.yaml`: registered sources and the assets the user asked
//!   for, written by `install` and read by `sync` and `list`
//! - `.arca-assets.lock`: the [`LockFile`], written after every fetch
//!
//! ```yaml
//! schema: "1.0"
//! sources:
//!   prompt-library:
//!     type: git
//!     provider: github
//!     url: https://github.com/acme/prompt-library.git
//!   shared:
//!     type: local
//!     path: ../shared-assets
//! assets:
//!   - id: greeting
//!     source: prompt-library
//!     version: ^2.0.0
//!     projections:
//!       default: .arca/assets/prompt-library/greeting.md
//! ```
//!
//! User-wide settings live in [`GlobalSettings`].

mod global;

pub use global::{GlobalSettings, global_config_path};

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_SCHEMA_VERSION, LOCKFILE_NAME};
use crate::core::ArcaError;
use crate::lockfile::LockFile;
use crate::models::SourceKind;
use crate::utils::atomic_write;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the cache root.
pub const CACHE_DIR_ENV: &str = "ARCA_CACHE_DIR";

/// Default projection name used when none is given.
pub const DEFAULT_PROJECTION: &str = "default";

/// Contents of `.arca-assets.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub schema: String,

    #[serde(default)]
    pub sources: BTreeMap<String, SourceConfig>,

    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA_VERSION.to_string(),
            sources: BTreeMap::new(),
            assets: Vec::new(),
        }
    }
}

/// A registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(rename = "type")]
    pub kind: SourceKind,

    /// Hosting provider, for display only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl SourceConfig {
    /// A git source; the provider is inferred from the host.
    #[must_use]
    pub fn git(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            kind: SourceKind::Git,
            provider: infer_provider(&url),
            url: Some(url),
            path: None,
        }
    }

    #[must_use]
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::Local,
            provider: None,
            url: None,
            path: Some(path.into()),
        }
    }

    /// The URL or path, whichever this kind uses.
    #[must_use]
    pub fn location(&self) -> &str {
        match self.kind {
            SourceKind::Git => self.url.as_deref().unwrap_or_default(),
            SourceKind::Local => self.path.as_deref().unwrap_or_default(),
        }
    }
}

fn infer_provider(url: &str) -> Option<String> {
    if url.contains("github.com") {
        Some("github".to_string())
    } else if url.contains("azure.com") {
        Some("azure".to_string())
    } else {
        None
    }
}

/// An asset the workspace asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: String,
    /// Source alias
    pub source: String,
    /// Version constraint as the user wrote it
    pub version: String,
    /// Projection name to workspace-relative target path
    #[serde(default)]
    pub projections: BTreeMap<String, String>,
}

impl WorkspaceConfig {
    /// Registers a source if its location is not yet known and returns its
    /// alias.
    ///
    /// A source whose URL (git) or path (local) is already registered keeps
    /// its alias. New aliases come from [`derive_alias`] and get `-1`, `-2`, ...
    /// appended until unique.
    pub fn ensure_source(&mut self, source: SourceConfig) -> String {
        if let Some((alias, _)) = self
            .sources
            .iter()
            .find(|(_, s)| s.kind == source.kind && s.location() == source.location())
        {
            return alias.clone();
        }

        let base = derive_alias(source.location());
        let mut alias = base.clone();
        let mut counter = 1;
        while self.sources.contains_key(&alias) {
            alias = format!("{base}-{counter}");
            counter += 1;
        }

        self.sources.insert(alias.clone(), source);
        alias
    }

    /// Adds `entry`, replacing an existing entry for the same `(id, source)`.
    pub fn add_asset(&mut self, entry: AssetEntry) {
        match self.assets.iter_mut().find(|a| a.id == entry.id && a.source == entry.source) {
            Some(existing) => *existing = entry,
            None => self.assets.push(entry),
        }
    }

    /// Looks up a registered source.
    pub fn source(&self, alias: &str) -> Result<&SourceConfig, ArcaError> {
        self.sources.get(alias).ok_or_else(|| ArcaError::SourceNotFound {
            name: alias.to_string(),
        })
    }
}

/// Alias for a source location: the last path segment without a trailing
/// slash or `.git`, or `source` if nothing is left.
#[must_use]
pub fn derive_alias(location: &str) -> String {
    let trimmed = location.trim_end_matches(['/', '\\']);
    let last = trimmed.rsplit(['/', '\\', ':']).next().unwrap_or_default();
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() { "source".to_string() } else { name.to_string() }
}

/// Reads and writes the files of one workspace.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    workspace_root: PathBuf,
}

impl ConfigManager {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    #[must_use]
    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.workspace_root.join(CONFIG_FILE_NAME)
    }

    #[must_use]
    pub fn lockfile_path(&self) -> PathBuf {
        self.workspace_root.join(LOCKFILE_NAME)
    }

    /// Loads `.arca-assets.yaml`; a missing or blank file is an empty config.
    pub fn load_config(&self) -> Result<WorkspaceConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(WorkspaceConfig::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config: {}", path.display()))?;
        if content.trim().is_empty() {
            return Ok(WorkspaceConfig::default());
        }

        serde_yaml::from_str(&content).map_err(|e| {
            ArcaError::ConfigParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    pub fn save_config(&self, config: &WorkspaceConfig) -> Result<()> {
        let path = self.config_path();
        let content = serde_yaml::to_string(config).context("Failed to serialize config")?;
        atomic_write(&path, content.as_bytes())
            .with_context(|| format!("Cannot write config: {}", path.display()))
    }

    pub fn load_lockfile(&self) -> Result<LockFile> {
        LockFile::load(&self.lockfile_path())
    }

    pub fn save_lockfile(&self, lock: &LockFile) -> Result<()> {
        lock.save(&self.lockfile_path())
    }

    /// Absolute directory of a local source; relative paths are taken from
    /// the workspace root.
    #[must_use]
    pub fn resolve_local_path(&self, path: &str) -> PathBuf {
        let path = crate::utils::expand_path(path).unwrap_or_else(|_| PathBuf::from(path));
        if path.is_absolute() { path } else { self.workspace_root.join(path) }
    }
}

/// Cache root: `ARCA_CACHE_DIR`, then the configured `cache_dir`, then
/// `~/.arca-cache`.
pub fn get_cache_dir(settings: &GlobalSettings) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV)
        && !dir.is_empty()
    {
        return crate::utils::expand_path(&dir);
    }

    if let Some(dir) = settings.cache_dir.as_deref() {
        return crate::utils::expand_path(dir);
    }

    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
        .join(".arca-cache"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    fn test_derive_alias() {
        assert_eq!(derive_alias("https://github.com/acme/prompt-library.git"), "prompt-library");
        assert_eq!(derive_alias("https://github.com/acme/prompts/"), "prompts");
        assert_eq!(derive_alias("../shared-assets"), "shared-assets");
        assert_eq!(derive_alias("git@github.com:acme/tools.git"), "tools");
        assert_eq!(derive_alias("/"), "source");
        assert_eq!(derive_alias(""), "source");
    }

    #[test]
    fn test_ensure_source_reuses_and_suffixes() {
        let mut config = WorkspaceConfig::default();

        let first = config.ensure_source(SourceConfig::git("https://github.com/a/lib.git"));
        let again = config.ensure_source(SourceConfig::git("https://github.com/a/lib.git"));
        let second = config.ensure_source(SourceConfig::git("https://example.com/b/lib"));
        let third = config.ensure_source(SourceConfig::local("/srv/lib"));

        assert_eq!(first, "lib");
        assert_eq!(again, "lib");
        assert_eq!(second, "lib-1");
        assert_eq!(third, "lib-2");
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources["lib"].provider.as_deref(), Some("github"));
        assert_eq!(config.sources["lib-1"].provider, None);
    }

    #[test]
    fn test_provider_inference() {
        assert_eq!(
            SourceConfig::git("https://dev.azure.com/org/p/_git/r").provider.as_deref(),
            Some("azure")
        );
    }

    #[test]
    fn test_add_asset_upserts() {
        let mut config = WorkspaceConfig::default();
        let entry = |version: &str| AssetEntry {
            id: "greeting".into(),
            source: "lib".into(),
            version: version.into(),
            projections: BTreeMap::new(),
        };

        config.add_asset(entry("1.0.0"));
        config.add_asset(AssetEntry {
            source: "other".into(),
            ..entry("1.0.0")
        });
        config.add_asset(entry("2.0.0"));

        assert_eq!(config.assets.len(), 2);
        assert_eq!(config.assets[0].version, "2.0.0");
        assert_eq!(config.assets[1].source, "other");
    }

    #[test]
    fn test_missing_config_is_default() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::new(temp.path());
        let config = manager.load_config().unwrap();
        assert_eq!(config.schema, "1.0");
        assert!(config.sources.is_empty());
        assert!(config.assets.is_empty());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::new(temp.path());

        let mut config = WorkspaceConfig::default();
        let alias = config.ensure_source(SourceConfig::local("../shared"));
        config.add_asset(AssetEntry {
            id: "greeting".into(),
            source: alias,
            version: "latest".into(),
            projections: BTreeMap::from([(DEFAULT_PROJECTION.into(), "out/greeting.md".into())]),
        });
        manager.save_config(&config).unwrap();

        let raw = std::fs::read_to_string(manager.config_path()).unwrap();
        assert!(raw.contains("type: local"));
        assert_eq!(manager.load_config().unwrap(), config);
    }

    #[test]
    fn test_bad_config_is_typed() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::new(temp.path());
        std::fs::write(manager.config_path(), "sources: [1, 2").unwrap();

        let err = manager.load_config().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ArcaError>(),
            Some(ArcaError::ConfigParseError { .. })
        ));
    }

    #[test]
    fn test_resolve_local_path() {
        let manager = ConfigManager::new("/work/space");
        assert_eq!(manager.resolve_local_path("assets"), PathBuf::from("/work/space/assets"));
        assert_eq!(manager.resolve_local_path("/abs/assets"), PathBuf::from("/abs/assets"));
    }

    #[test]
    #[serial]
    fn test_cache_dir_precedence() {
        let settings = GlobalSettings {
            cache_dir: Some("/configured/cache".into()),
            ..GlobalSettings::default()
        };

        // SAFETY: serialised with other environment-mutating tests.
        unsafe { std::env::set_var(CACHE_DIR_ENV, "/env/cache") };
        assert_eq!(get_cache_dir(&settings).unwrap(), PathBuf::from("/env/cache"));

        unsafe { std::env::remove_var(CACHE_DIR_ENV) };
        assert_eq!(get_cache_dir(&settings).unwrap(), PathBuf::from("/configured/cache"));

        let fallback = get_cache_dir(&GlobalSettings::default()).unwrap();
        assert!(fallback.ends_with(".arca-cache"));
    }
}
