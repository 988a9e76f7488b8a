//! Content fetching from asset sources.
//!
//! A source is either a local directory or a git repository; both publish an
//! `arca-manifest.yaml` at their root. [`ContentFetcher`] is the seam the
//! installer talks to:
//!
//! - [`LocalFetcher`] reads the directory in place and reports the revision
//!   `local`.
//! - [`GitFetcher`] shallow-fetches one revision per request into a
//!   temporary checkout, shared by every request for that revision, and
//!   reports the commit id.
//!
//! [`Fetcher`] dispatches between the two based on the source's
//! [`SourceKind`].

pub mod credentials;
pub mod local;
pub mod remote;

use anyhow::{Context, Result};
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use credentials::{
    Anonymous, CredentialProvider, Credentials, EnvCredentialProvider, authenticated_url,
};
pub use local::LocalFetcher;
pub use remote::GitFetcher;

use crate::config::{ConfigManager, GlobalSettings, SourceConfig};
use crate::core::ArcaError;
use crate::lockfile::checksum::hash_content;
use crate::manifest::Manifest;
use crate::models::{Artifact, SourceKind};
use crate::utils::{join_contained, redact_credentials};

/// A single file read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub content: Vec<u8>,
    /// Commit id, or `local`
    pub revision: String,
}

/// A parsed manifest plus where it came from.
#[derive(Debug, Clone)]
pub struct ManifestSnapshot {
    pub manifest: Manifest,
    /// SHA-256 of the raw manifest bytes
    pub sha256: String,
    /// Commit id the manifest was read at, or `local`
    pub revision: String,
}

/// Reads asset content from a source.
///
/// `revision` is a branch, tag or commit; `None` means the source's default
/// state. Local sources ignore it.
pub trait ContentFetcher: Send + Sync {
    fn fetch_file(
        &self,
        path: &str,
        revision: Option<&str>,
    ) -> impl Future<Output = Result<FetchedFile>> + Send;

    /// Copies the directory at `path` into `destination` (created if absent)
    /// and returns the revision it was read at.
    fn fetch_directory(
        &self,
        path: &str,
        revision: Option<&str>,
        destination: &Path,
    ) -> impl Future<Output = Result<String>> + Send;

    fn load_manifest(
        &self,
        revision: Option<&str>,
    ) -> impl Future<Output = Result<ManifestSnapshot>> + Send;
}

/// Settings shared by every fetcher of a run.
#[derive(Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub retry_attempts: usize,
    pub credentials: Arc<dyn CredentialProvider>,
}

impl FetchOptions {
    #[must_use]
    pub fn from_settings(settings: &GlobalSettings) -> Self {
        Self {
            timeout: settings.git_timeout(),
            retry_attempts: settings.retry_attempts(),
            credentials: Arc::new(EnvCredentialProvider),
        }
    }

    #[must_use]
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialProvider>) -> Self {
        self.credentials = credentials;
        self
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from_settings(&GlobalSettings::default())
    }
}

/// Fetcher for one configured source.
pub enum Fetcher {
    Local(LocalFetcher),
    Git(GitFetcher),
}

impl Fetcher {
    /// Builds the fetcher for `source`, registered under `alias`. Relative
    /// local paths are resolved against the workspace root.
    pub fn for_source(
        alias: &str,
        source: &SourceConfig,
        workspace: &ConfigManager,
        options: FetchOptions,
    ) -> Result<Self> {
        let location = source.location();
        if location.is_empty() {
            return Err(ArcaError::SourceUnreachable {
                name: alias.to_string(),
                url: String::new(),
                reason: format!("no {} configured", match source.kind {
                    SourceKind::Git => "url",
                    SourceKind::Local => "path",
                }),
            }
            .into());
        }

        Ok(match source.kind {
            SourceKind::Local => {
                Self::Local(LocalFetcher::new(alias, workspace.resolve_local_path(location)))
            }
            SourceKind::Git => {
                crate::git::ensure_git_available()?;
                Self::Git(GitFetcher::new(alias, location, options))
            }
        })
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        match self {
            Self::Local(f) => f.alias(),
            Self::Git(f) => f.alias(),
        }
    }

    /// URL or directory, with credentials redacted.
    #[must_use]
    pub fn display_location(&self) -> String {
        match self {
            Self::Local(f) => f.root().display().to_string(),
            Self::Git(f) => redact_credentials(f.url()),
        }
    }
}

impl ContentFetcher for Fetcher {
    async fn fetch_file(&self, path: &str, revision: Option<&str>) -> Result<FetchedFile> {
        match self {
            Self::Local(f) => f.fetch_file(path, revision).await,
            Self::Git(f) => f.fetch_file(path, revision).await,
        }
    }

    async fn fetch_directory(
        &self,
        path: &str,
        revision: Option<&str>,
        destination: &Path,
    ) -> Result<String> {
        match self {
            Self::Local(f) => f.fetch_directory(path, revision, destination).await,
            Self::Git(f) => f.fetch_directory(path, revision, destination).await,
        }
    }

    async fn load_manifest(&self, revision: Option<&str>) -> Result<ManifestSnapshot> {
        match self {
            Self::Local(f) => f.load_manifest(revision).await,
            Self::Git(f) => f.load_manifest(revision).await,
        }
    }
}

/// Materialises an asset at `destination`: a file artifact is written there,
/// a directory artifact is copied into it. Returns the revision.
pub async fn fetch_artifact<F: ContentFetcher>(
    fetcher: &F,
    path: &str,
    revision: Option<&str>,
    artifact: Artifact,
    destination: &Path,
) -> Result<String> {
    match artifact {
        Artifact::File => {
            let fetched = fetcher.fetch_file(path, revision).await?;
            tokio::fs::write(destination, &fetched.content)
                .await
                .with_context(|| format!("Failed to write {}", destination.display()))?;
            Ok(fetched.revision)
        }
        Artifact::Directory => fetcher.fetch_directory(path, revision, destination).await,
    }
}

/// Resolves a manifest path inside a source root.
///
/// Fails with [`ArcaError::PathNotFound`] when the path escapes the root,
/// reaches into `.git`, does not exist, or is not of the expected artifact
/// kind.
pub(crate) fn locate(
    root: &Path,
    path: &str,
    artifact: Artifact,
    source_name: &str,
    revision: &str,
) -> Result<PathBuf, ArcaError> {
    let not_found = || ArcaError::PathNotFound {
        path: path.to_string(),
        source_name: source_name.to_string(),
        revision: revision.to_string(),
    };

    let in_git_dir = Path::new(path)
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == ".git"));
    if in_git_dir {
        return Err(not_found());
    }

    let full = join_contained(root, path).ok_or_else(not_found)?;
    let matches_kind = match artifact {
        Artifact::File => full.is_file(),
        Artifact::Directory => full.is_dir(),
    };
    if matches_kind { Ok(full) } else { Err(not_found()) }
}

/// Reads and parses the manifest at the root of a source.
pub(crate) async fn read_manifest(
    root: &Path,
    source_name: &str,
    revision: &str,
) -> Result<ManifestSnapshot> {
    let path = locate(
        root,
        crate::constants::MANIFEST_FILE_NAME,
        Artifact::File,
        source_name,
        revision,
    )?;
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let content = String::from_utf8_lossy(&bytes);
    let manifest = Manifest::parse(&content, &format!("{source_name}:{}", path.display()))?;

    Ok(ManifestSnapshot {
        manifest,
        sha256: hash_content(&bytes),
        revision: revision.to_string(),
    })
}

/// Copies a source directory into `destination` off the async runtime.
pub(crate) async fn copy_tree(source: PathBuf, destination: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || crate::utils::copy_dir(&source, &destination))
        .await
        .context("Directory copy task failed")?
}
