//! Git sources.
//!
//! Each distinct revision is fetched once per [`GitFetcher`] into its own
//! temporary checkout. Concurrent requests for the same revision wait on the
//! same [`OnceCell`] instead of fetching twice, and once a checkout exists it
//! is also registered under its commit id so that requests pinned to that
//! commit reuse it.

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::sync::OnceCell;

use super::{
    ContentFetcher, FetchOptions, FetchedFile, ManifestSnapshot, authenticated_url, copy_tree,
    locate, read_manifest,
};
use crate::core::{ArcaError, classify};
use crate::git::{DEFAULT_REVISION, GitRepo};
use crate::models::Artifact;
use crate::utils::backoff::retry_unreachable;
use crate::utils::redact_credentials;

struct Checkout {
    _dir: TempDir,
    root: PathBuf,
    commit: String,
}

type CheckoutCell = Arc<OnceCell<Arc<Checkout>>>;

pub struct GitFetcher {
    alias: String,
    url: String,
    options: FetchOptions,
    checkouts: DashMap<String, CheckoutCell>,
}

impl GitFetcher {
    pub fn new(alias: impl Into<String>, url: impl Into<String>, options: FetchOptions) -> Self {
        Self {
            alias: alias.into(),
            url: url.into(),
            options,
            checkouts: DashMap::new(),
        }
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The configured URL. May carry credentials; redact before display.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn checkout(&self, revision: Option<&str>) -> Result<Arc<Checkout>> {
        let key = revision.filter(|r| !r.is_empty()).unwrap_or(DEFAULT_REVISION).to_string();
        let cell = Arc::clone(&self.checkouts.entry(key.clone()).or_default());

        let checkout = cell
            .get_or_try_init(|| {
                retry_unreachable(self.options.retry_attempts, || self.fetch_revision(&key))
            })
            .await?
            .clone();

        if checkout.commit != key {
            self.checkouts
                .entry(checkout.commit.clone())
                .or_insert_with(|| Arc::new(OnceCell::new_with(Some(Arc::clone(&checkout)))));
        }
        Ok(checkout)
    }

    async fn fetch_revision(&self, revision: &str) -> Result<Arc<Checkout>> {
        let dir = tempfile::Builder::new()
            .prefix("arca-checkout-")
            .tempdir()
            .context("Failed to create checkout directory")?;

        let credentials = self.options.credentials.credentials_for(&self.url);
        let url = authenticated_url(&self.url, credentials.as_ref());
        let wanted = (revision != DEFAULT_REVISION).then_some(revision);

        let repo =
            GitRepo::shallow_fetch(&url, wanted, dir.path(), self.options.timeout, &self.alias)
                .await
                .map_err(|e| self.unreachable(e))?;
        let commit = repo.head_commit().await?;

        tracing::debug!(
            target: "source",
            "({}) Fetched {} at {revision} -> {commit}",
            self.alias,
            redact_credentials(&self.url)
        );

        Ok(Arc::new(Checkout {
            root: dir.path().to_path_buf(),
            _dir: dir,
            commit,
        }))
    }

    fn unreachable(&self, error: anyhow::Error) -> anyhow::Error {
        let reason = match classify(&error) {
            Some(ArcaError::GitNotFound) => return error,
            Some(ArcaError::GitCommandError {
                stderr,
                ..
            }) => stderr.clone(),
            _ => error.to_string(),
        };
        ArcaError::SourceUnreachable {
            name: self.alias.clone(),
            url: redact_credentials(&self.url),
            reason: redact_credentials(&reason),
        }
        .into()
    }
}

impl ContentFetcher for GitFetcher {
    async fn fetch_file(&self, path: &str, revision: Option<&str>) -> Result<FetchedFile> {
        let checkout = self.checkout(revision).await?;
        let full = locate(&checkout.root, path, Artifact::File, &self.alias, &checkout.commit)?;
        let content = tokio::fs::read(&full)
            .await
            .with_context(|| format!("Failed to read {path} from {}", self.alias))?;

        Ok(FetchedFile {
            content,
            revision: checkout.commit.clone(),
        })
    }

    async fn fetch_directory(
        &self,
        path: &str,
        revision: Option<&str>,
        destination: &Path,
    ) -> Result<String> {
        let checkout = self.checkout(revision).await?;
        let full = locate(&checkout.root, path, Artifact::Directory, &self.alias, &checkout.commit)?;
        copy_tree(full, destination.to_path_buf()).await?;
        Ok(checkout.commit.clone())
    }

    async fn load_manifest(&self, revision: Option<&str>) -> Result<ManifestSnapshot> {
        let checkout = self.checkout(revision).await?;
        read_manifest(&checkout.root, &self.alias, &checkout.commit).await
    }
}
