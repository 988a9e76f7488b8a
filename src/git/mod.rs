//! Git access through the system `git` binary.
//!
//! ARCA never clones full histories. A checkout is a fresh repository into
//! which exactly one revision is fetched at depth 1:
//!
//! ```text
//! git init
//! git fetch --depth 1 <url> <revision>   # falls back to HEAD if the revision is unknown
//! git checkout --detach FETCH_HEAD
//! git rev-parse HEAD                     # the commit recorded in the lockfile
//! ```
//!
//! The URL is passed to `fetch` directly rather than stored as a remote, so
//! credentials embedded in it never reach `.git/config`.

pub mod command_builder;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use command_builder::{GitCommand, GitCommandOutput};

use crate::core::ArcaError;

/// Revision fetched when none is requested, or the requested one is missing.
pub const DEFAULT_REVISION: &str = "HEAD";

/// A local working tree created by [`GitRepo::shallow_fetch`].
#[derive(Debug, Clone)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetches `revision` (or the default branch) from `url` into `target` and
    /// checks it out.
    ///
    /// If the named revision cannot be fetched the default state of the
    /// repository is fetched instead; only when that also fails is the error
    /// returned. `label` prefixes log lines and must not contain secrets.
    pub async fn shallow_fetch(
        url: &str,
        revision: Option<&str>,
        target: &Path,
        timeout: Duration,
        label: &str,
    ) -> Result<Self> {
        GitCommand::init().current_dir(target).with_context(label).execute_success().await?;

        let wanted = revision.filter(|r| !r.is_empty()).unwrap_or(DEFAULT_REVISION);
        let fetched = GitCommand::fetch_shallow(url, wanted)
            .current_dir(target)
            .with_timeout(Some(timeout))
            .with_context(label)
            .execute_success()
            .await;

        if let Err(e) = fetched {
            if wanted == DEFAULT_REVISION {
                return Err(e);
            }
            tracing::debug!(
                target: "git",
                "({label}) Revision {wanted} not fetchable, falling back to {DEFAULT_REVISION}: {e}"
            );
            GitCommand::fetch_shallow(url, DEFAULT_REVISION)
                .current_dir(target)
                .with_timeout(Some(timeout))
                .with_context(label)
                .execute_success()
                .await?;
        }

        GitCommand::checkout_fetch_head()
            .current_dir(target)
            .with_context(label)
            .execute_success()
            .await?;

        Ok(Self::new(target))
    }

    /// Full commit id of the checked-out revision.
    pub async fn head_commit(&self) -> Result<String> {
        GitCommand::current_commit().current_dir(&self.path).execute_stdout().await
    }
}

/// Whether a `git` executable is on `PATH`.
#[must_use]
pub fn is_git_installed() -> bool {
    which::which(crate::utils::get_git_command()).is_ok()
}

pub fn ensure_git_available() -> Result<()> {
    if !is_git_installed() {
        return Err(ArcaError::GitNotFound.into());
    }
    Ok(())
}
