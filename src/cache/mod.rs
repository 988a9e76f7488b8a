//! Content-addressable cache of fetched artifacts.
//!
//! Every fetched artifact lives at a path that is a pure function of
//! `(source alias, asset id, version, artifact shape)`:
//!
//! ```text
//! <root>/
//! ├── .locks/<alias>/<id>/<version>.lock   advisory lock per entry
//! ├── .staging/                            in-progress writes
//! └── <alias>/<id>/<version>/
//!     ├── <id>.md                          single-file artifact
//!     └── ...                              or the directory artifact itself
//! ```
//!
//! Path components are escaped so that separators or dot segments inside an
//! id or version cannot make two tuples share a path.
//!
//! Writes go through [`Cache::begin`], which takes the entry lock and hands
//! out a staging location on the same filesystem. [`StagedEntry::commit`]
//! renames the staged content into place, so an entry is either absent or
//! complete. Staging directories left behind by an interrupted run are never
//! read. [`Cache::clean_stale_staging`] reclaims them at the start of the next
//! run and [`Cache::clean_staging`] removes all of them.
//!
//! The root is injected at construction; the cache never consults the
//! environment to find it.

pub mod lock;

use crate::constants::{
    CACHE_LOCK_TIMEOUT, CACHE_LOCKS_DIR, CACHE_STAGING_DIR, FILE_ARTIFACT_EXTENSION,
};
use crate::core::ArcaError;
use crate::models::Artifact;
use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use walkdir::WalkDir;

pub use lock::EntryLock;

/// Handle on a cache root directory.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
}

impl Cache {
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory owning everything cached for one tuple.
    #[must_use]
    pub fn entry_dir(&self, alias: &str, id: &str, version: &str) -> PathBuf {
        self.root
            .join(escape_component(alias))
            .join(escape_component(id))
            .join(escape_component(version))
    }

    /// Location of the artifact for a tuple.
    ///
    /// Pure: the same arguments always produce the same path, and changing
    /// any one of them produces a different path.
    #[must_use]
    pub fn path(&self, alias: &str, id: &str, version: &str, artifact: Artifact) -> PathBuf {
        let entry = self.entry_dir(alias, id, version);
        match artifact {
            Artifact::File => entry.join(file_artifact_name(id)),
            Artifact::Directory => entry,
        }
    }

    /// Creates the entry directory for a tuple. Idempotent.
    pub fn ensure(&self, alias: &str, id: &str, version: &str) -> Result<PathBuf> {
        let dir = self.entry_dir(alias, id, version);
        std::fs::create_dir_all(&dir).map_err(|e| unwritable(&dir, &e))?;
        Ok(dir)
    }

    /// Whether a complete artifact is present for a tuple.
    #[cfg(test)]
    pub(crate) fn contains(&self, alias: &str, id: &str, version: &str, artifact: Artifact) -> bool {
        let path = self.path(alias, id, version, artifact);
        match artifact {
            Artifact::File => path.is_file(),
            Artifact::Directory => path.is_dir(),
        }
    }

    /// Locks a tuple and prepares a staging location for its artifact.
    ///
    /// The lock is held until the returned [`StagedEntry`] is committed or
    /// dropped.
    pub async fn begin(
        &self,
        alias: &str,
        id: &str,
        version: &str,
        artifact: Artifact,
    ) -> Result<StagedEntry> {
        let lock_path = self
            .root
            .join(CACHE_LOCKS_DIR)
            .join(escape_component(alias))
            .join(escape_component(id))
            .join(format!("{}.lock", escape_component(version)));
        let lock = EntryLock::acquire(&lock_path, CACHE_LOCK_TIMEOUT).await?;

        let staging_root = self.root.join(CACHE_STAGING_DIR);
        std::fs::create_dir_all(&staging_root).map_err(|e| unwritable(&staging_root, &e))?;
        let staging = tempfile::Builder::new()
            .prefix("entry-")
            .tempdir_in(&staging_root)
            .map_err(|e| unwritable(&staging_root, &e))?;

        let staged_path = match artifact {
            Artifact::File => staging.path().join(file_artifact_name(id)),
            Artifact::Directory => staging.path().join("tree"),
        };

        Ok(StagedEntry {
            _lock: lock,
            staging,
            staged_path,
            entry_dir: self.entry_dir(alias, id, version),
            final_path: self.path(alias, id, version, artifact),
            artifact,
        })
    }

    /// Removes the whole cache. A missing root is not an error.
    pub fn clear(&self) -> Result<()> {
        crate::utils::remove_dir_all(&self.root)
            .map_err(|e| unwritable(&self.root, &e))
            .with_context(|| format!("Failed to clear cache at {}", self.root.display()))
    }

    /// Removes leftovers of interrupted writes.
    pub fn clean_staging(&self) -> Result<()> {
        crate::utils::remove_dir_all(&self.root.join(CACHE_STAGING_DIR))
    }

    /// Removes staging directories not modified for `max_age`, returning how
    /// many were removed.
    pub fn clean_stale_staging(&self, max_age: Duration) -> Result<usize> {
        let staging_root = self.root.join(CACHE_STAGING_DIR);
        let entries = match std::fs::read_dir(&staging_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Cannot read {}", staging_root.display()));
            }
        };

        let now = SystemTime::now();
        let mut removed = 0;
        for entry in entries {
            let entry = entry.with_context(|| format!("Cannot read {}", staging_root.display()))?;
            let modified = entry.metadata().and_then(|m| m.modified());
            let stale = modified
                .map(|time| now.duration_since(time).unwrap_or_default() >= max_age)
                .unwrap_or(false);
            if !stale {
                continue;
            }

            let path = entry.path();
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                crate::utils::remove_dir_all(&path)?;
            } else {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Cannot remove {}", path.display()))?;
            }
            tracing::debug!("Removed stale staging entry {}", path.display());
            removed += 1;
        }
        Ok(removed)
    }

    /// Total bytes of regular files under the root.
    pub fn size(&self) -> Result<u64> {
        if !self.root.exists() {
            return Ok(0);
        }
        let mut total = 0;
        for entry in WalkDir::new(&self.root) {
            let entry = entry
                .with_context(|| format!("Failed to read cache entry in {}", self.root.display()))?;
            if entry.file_type().is_file() {
                total += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        Ok(total)
    }
}

/// An in-progress cache write, holding the entry lock.
#[derive(Debug)]
pub struct StagedEntry {
    _lock: EntryLock,
    staging: TempDir,
    staged_path: PathBuf,
    entry_dir: PathBuf,
    final_path: PathBuf,
    artifact: Artifact,
}

impl StagedEntry {
    /// Where the fetcher should write: a file path for [`Artifact::File`], a
    /// not-yet-existing directory for [`Artifact::Directory`].
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.staged_path
    }

    /// Moves the staged artifact into its cache location, replacing any
    /// previous content, and releases the lock. Returns the final path.
    pub fn commit(self) -> Result<PathBuf> {
        match self.artifact {
            Artifact::File => {
                std::fs::create_dir_all(&self.entry_dir)
                    .map_err(|e| unwritable(&self.entry_dir, &e))?;
                std::fs::rename(&self.staged_path, &self.final_path)
                    .map_err(|e| unwritable(&self.final_path, &e))?;
            }
            Artifact::Directory => {
                if !self.staged_path.is_dir() {
                    std::fs::create_dir_all(&self.staged_path)
                        .map_err(|e| unwritable(&self.staged_path, &e))?;
                }
                if let Some(parent) = self.final_path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| unwritable(parent, &e))?;
                }
                crate::utils::remove_dir_all(&self.final_path)
                    .map_err(|e| unwritable(&self.final_path, &e))?;
                std::fs::rename(&self.staged_path, &self.final_path)
                    .map_err(|e| unwritable(&self.final_path, &e))?;
            }
        }

        tracing::debug!("Cached {}", self.final_path.display());
        drop(self.staging);
        Ok(self.final_path)
    }
}

fn file_artifact_name(id: &str) -> String {
    format!("{}.{FILE_ARTIFACT_EXTENSION}", escape_component(id))
}

fn unwritable(path: &Path, error: &dyn std::fmt::Display) -> anyhow::Error {
    ArcaError::CacheUnwritable {
        path: path.display().to_string(),
        reason: error.to_string(),
    }
    .into()
}

/// Escapes one path component so the mapping from strings to components is
/// injective and never leaves the parent directory.
fn escape_component(raw: &str) -> String {
    match raw {
        "" => return "%".to_string(),
        "." => return "%2E".to_string(),
        ".." => return "%2E%2E".to_string(),
        _ => {}
    }

    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' | '/' | '\\' | ':' | '\0' => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            _ => out.push(c),
        }
    }
    out
}
