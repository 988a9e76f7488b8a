//! Projection of cached artifacts into the workspace.
//!
//! A projection is a symlink at a workspace path pointing at a cache entry.
//! Where symlinks cannot be created (restricted Windows accounts, some
//! network filesystems) the artifact is copied instead. Every projected path
//! is appended to the workspace `.gitignore` below a marker comment:
//!
//! ```text
//! # ARCA managed assets
//! .arca/assets/prompt-library/greeting.md
//! ```

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::constants::{FILE_ARTIFACT_EXTENSION, GITIGNORE_MARKER};
use crate::models::Artifact;
use crate::utils::fs::ensure_parent_dir;
use crate::utils::{atomic_write, copy_dir, normalize_path_for_storage};

/// Workspace directory that default projections live under.
pub const DEFAULT_PROJECTION_DIR: &str = ".arca/assets";

/// How a projection was materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    Symlink,
    Copy,
}

impl fmt::Display for ProjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symlink => write!(f, "symlink"),
            Self::Copy => write!(f, "copy"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Absolute path of the projected artifact
    pub path: PathBuf,
    pub mode: ProjectionMode,
}

#[derive(Debug, Clone)]
pub struct Projector {
    workspace_root: PathBuf,
}

impl Projector {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
        }
    }

    /// Materialises `cached` at `target` (relative to the workspace root),
    /// replacing whatever was there, and registers it in `.gitignore`.
    ///
    /// A `.gitignore` that cannot be updated is logged, not returned.
    pub fn project(&self, cached: &Path, target: &str, artifact: Artifact) -> Result<Projection> {
        let absolute = self.workspace_root.join(target);
        ensure_parent_dir(&absolute)?;
        remove_existing(&absolute)?;

        let mode = match create_symlink(cached, &absolute, artifact) {
            Ok(()) => ProjectionMode::Symlink,
            Err(e) => {
                tracing::debug!(
                    "Symlink {} -> {} failed ({e}), copying instead",
                    absolute.display(),
                    cached.display()
                );
                match artifact {
                    Artifact::File => {
                        std::fs::copy(cached, &absolute).with_context(|| {
                            format!("Failed to copy {} to {}", cached.display(), absolute.display())
                        })?;
                    }
                    Artifact::Directory => copy_dir(cached, &absolute)?,
                }
                ProjectionMode::Copy
            }
        };

        if let Err(e) = self.ensure_gitignored(&absolute) {
            tracing::warn!("Failed to update .gitignore for {}: {e:#}", absolute.display());
        }

        tracing::debug!("Projected {} ({mode})", absolute.display());
        Ok(Projection {
            path: absolute,
            mode,
        })
    }

    /// Adds `absolute` to the workspace `.gitignore` as a forward-slash path
    /// relative to the workspace root. Returns whether the file changed.
    /// Paths outside the workspace are ignored.
    pub fn ensure_gitignored(&self, absolute: &Path) -> Result<bool> {
        let Ok(relative) = absolute.strip_prefix(&self.workspace_root) else {
            return Ok(false);
        };
        let entry = normalize_path_for_storage(relative);

        let gitignore = self.workspace_root.join(".gitignore");
        let content = match std::fs::read_to_string(&gitignore) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", gitignore.display()));
            }
        };

        if content.lines().any(|line| line.trim() == entry) {
            return Ok(false);
        }

        let mut updated = content.clone();
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        if !content.lines().any(|line| line.trim() == GITIGNORE_MARKER) {
            if !updated.is_empty() {
                updated.push('\n');
            }
            updated.push_str(GITIGNORE_MARKER);
            updated.push('\n');
        }
        updated.push_str(&entry);
        updated.push('\n');

        atomic_write(&gitignore, updated.as_bytes())?;
        Ok(true)
    }
}

/// Workspace-relative default target: `.arca/assets/<alias>/<id>.md` for a
/// file, `.arca/assets/<alias>/<id>` for a directory.
#[must_use]
pub fn default_target(alias: &str, id: &str, artifact: Artifact) -> String {
    match artifact {
        Artifact::File => format!("{DEFAULT_PROJECTION_DIR}/{alias}/{id}.{FILE_ARTIFACT_EXTENSION}"),
        Artifact::Directory => format!("{DEFAULT_PROJECTION_DIR}/{alias}/{id}"),
    }
}

fn remove_existing(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect {}", path.display())),
    };

    let removed = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    removed.with_context(|| format!("Failed to remove existing projection: {}", path.display()))
}

#[cfg(unix)]
fn create_symlink(original: &Path, link: &Path, _artifact: Artifact) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn create_symlink(original: &Path, link: &Path, artifact: Artifact) -> std::io::Result<()> {
    match artifact {
        Artifact::File => std::os::windows::fs::symlink_file(original, link),
        Artifact::Directory => std::os::windows::fs::symlink_dir(original, link),
    }
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_original: &Path, _link: &Path, _artifact: Artifact) -> std::io::Result<()> {
    Err(std::io::Error::new(std::io::ErrorKind::Unsupported, "symlinks unsupported"))
}
