//! Sources that are plain directories.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::{ContentFetcher, FetchedFile, ManifestSnapshot, copy_tree, locate, read_manifest};
use crate::constants::LOCAL_REVISION;
use crate::core::ArcaError;
use crate::models::Artifact;

/// Reads a directory source in place. Revisions are ignored and always
/// reported as `local`.
#[derive(Debug, Clone)]
pub struct LocalFetcher {
    alias: String,
    root: PathBuf,
}

impl LocalFetcher {
    pub fn new(alias: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            alias: alias.into(),
            root: root.into(),
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_root(&self) -> Result<(), ArcaError> {
        if self.root.is_dir() {
            return Ok(());
        }
        Err(ArcaError::SourceUnreachable {
            name: self.alias.clone(),
            url: self.root.display().to_string(),
            reason: "directory does not exist".to_string(),
        })
    }
}

impl ContentFetcher for LocalFetcher {
    async fn fetch_file(&self, path: &str, _revision: Option<&str>) -> Result<FetchedFile> {
        self.ensure_root()?;
        let full = locate(&self.root, path, Artifact::File, &self.alias, LOCAL_REVISION)?;
        let content = tokio::fs::read(&full)
            .await
            .with_context(|| format!("Failed to read {}", full.display()))?;

        tracing::trace!(target: "source", "({}) Read {path} ({} bytes)", self.alias, content.len());
        Ok(FetchedFile {
            content,
            revision: LOCAL_REVISION.to_string(),
        })
    }

    async fn fetch_directory(
        &self,
        path: &str,
        _revision: Option<&str>,
        destination: &Path,
    ) -> Result<String> {
        self.ensure_root()?;
        let full = locate(&self.root, path, Artifact::Directory, &self.alias, LOCAL_REVISION)?;
        copy_tree(full, destination.to_path_buf()).await?;
        Ok(LOCAL_REVISION.to_string())
    }

    async fn load_manifest(&self, _revision: Option<&str>) -> Result<ManifestSnapshot> {
        self.ensure_root()?;
        read_manifest(&self.root, &self.alias, LOCAL_REVISION).await
    }
}
