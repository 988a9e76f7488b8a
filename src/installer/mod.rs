//! The resolve → fetch → cache → hash → lock pipeline.
//!
//! Two entry points share the per-node work:
//!
//! - [`Installer::install`] handles one user request. Any failure aborts the
//!   whole request before the lockfile or configuration is touched.
//! - [`Installer::sync`] re-processes every configured asset. Failures are
//!   isolated per asset and per node: whatever succeeded is locked and
//!   persisted, whatever failed is returned in the [`SyncReport`].
//!
//! Graph resolution always completes before the first fetch. Nodes are then
//! fetched concurrently, at most `max_parallel` at a time; each fetch writes
//! through the cache's per-entry lock and staging area, and is hashed before
//! it is committed. Lock entries are recorded in breadth-first graph order
//! through a [`LockAccumulator`].

mod accumulator;
pub mod listing;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::pin::pin;

pub use accumulator::LockAccumulator;
pub use listing::{ListedAsset, RemoteAsset, RemoteListing};

use crate::cache::Cache;
use crate::constants::STALE_STAGING_AGE;
use crate::config::{AssetEntry, ConfigManager, GlobalSettings, SourceConfig, WorkspaceConfig};
use crate::core::{ArcaError, classify};
use crate::lockfile::LockedAsset;
use crate::lockfile::checksum::hash_artifact;
use crate::projector::{Projection, Projector, default_target};
use crate::resolver::{ResolvedNode, resolve_graph};
use crate::source::{ContentFetcher, FetchOptions, Fetcher, ManifestSnapshot, fetch_artifact};
use crate::utils::progress::ProgressBar;

/// Outcome of [`Installer::install`].
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Alias the source is registered under
    pub source: String,
    /// Every locked node, root first
    pub assets: Vec<LockedAsset>,
    pub projection: Projection,
}

impl InstallReport {
    #[must_use]
    pub fn root(&self) -> Option<&LockedAsset> {
        self.assets.first()
    }
}

/// An asset or node that could not be synced.
#[derive(Debug)]
pub struct SyncFailure {
    pub source: String,
    pub id: String,
    pub error: anyhow::Error,
}

/// Outcome of [`Installer::sync`].
#[derive(Debug, Default)]
pub struct SyncReport {
    pub synced: Vec<LockedAsset>,
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

struct FetchedNode {
    node: ResolvedNode,
    cached: PathBuf,
    locked: LockedAsset,
}

struct NodeResult {
    index: usize,
    id: String,
    result: Result<FetchedNode>,
}

/// Whether a sync may skip this failure and continue with other assets.
fn is_per_asset(error: &anyhow::Error) -> bool {
    classify(error).is_none_or(ArcaError::is_per_asset)
}

/// Runs the pipeline for one workspace.
pub struct Installer {
    workspace: ConfigManager,
    cache: Cache,
    settings: GlobalSettings,
    fetch_options: FetchOptions,
    projector: Projector,
    quiet: bool,
}

impl Installer {
    pub fn new(workspace_root: impl Into<PathBuf>, cache: Cache, settings: GlobalSettings) -> Self {
        let workspace_root = workspace_root.into();
        Self {
            workspace: ConfigManager::new(&workspace_root),
            projector: Projector::new(&workspace_root),
            fetch_options: FetchOptions::from_settings(&settings),
            cache,
            settings,
            quiet: false,
        }
    }

    #[must_use]
    pub fn with_fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Hides progress output.
    #[must_use]
    pub const fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    #[must_use]
    pub fn workspace(&self) -> &ConfigManager {
        &self.workspace
    }

    #[must_use]
    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    /// Drops staging leftovers of killed runs. Failure only costs disk space.
    fn reclaim_staging(&self) {
        match self.cache.clean_stale_staging(STALE_STAGING_AGE) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!("Reclaimed {removed} interrupted cache write(s)"),
            Err(e) => tracing::warn!("Cannot reclaim interrupted cache writes: {e:#}"),
        }
    }

    /// Installs `asset_id` at `constraint` from `source` (an alias, a local
    /// directory or a git URL) and everything it depends on.
    ///
    /// On success the lockfile holds one entry per resolved node, the
    /// workspace config holds the asset with the constraint as written, and
    /// the root artifact is projected under `projection` (at `target`, the
    /// previously configured target, or the default location).
    pub async fn install(
        &self,
        source: &str,
        asset_id: &str,
        constraint: &str,
        projection: &str,
        target: Option<&str>,
    ) -> Result<InstallReport> {
        self.reclaim_staging();
        let mut config = self.workspace.load_config()?;
        let lock = LockAccumulator::new(self.workspace.load_lockfile()?);

        let alias = self.register_source(&mut config, source);
        let fetcher = self.fetcher(&config, &alias)?;
        tracing::info!("Installing {asset_id}@{constraint} from {}", fetcher.display_location());

        let snapshot = fetcher.load_manifest(None).await?;
        let graph = resolve_graph(&snapshot.manifest, asset_id, constraint)?;
        tracing::debug!("Resolved {} node(s) for {asset_id}", graph.len());

        let progress = ProgressBar::new(graph.len() as u64, self.quiet);
        progress.set_message(format!("Fetching {asset_id}"));

        let mut fetched = Vec::with_capacity(graph.len());
        {
            let mut results =
                pin!(self.fetch_nodes(&fetcher, &alias, &snapshot, graph.into_nodes(), &progress));
            while let Some(outcome) = results.next().await {
                // Dropping the stream cancels fetches still in flight.
                fetched.push((outcome.index, outcome.result?));
            }
        }
        progress.finish_and_clear();
        fetched.sort_by_key(|(index, _)| *index);

        for (_, node) in &fetched {
            lock.record(node.locked.clone()).await;
        }
        lock.persist(&self.workspace).await?;

        let (_, root) = fetched
            .first()
            .ok_or_else(|| anyhow::anyhow!("Resolution of '{asset_id}' produced no nodes"))?;
        let existing = config.assets.iter().find(|a| a.id == asset_id && a.source == alias);
        let target = target
            .map(str::to_string)
            .or_else(|| existing.and_then(|a| a.projections.get(projection).cloned()))
            .unwrap_or_else(|| default_target(&alias, asset_id, root.node.artifact()));
        let mut projections = existing.map(|a| a.projections.clone()).unwrap_or_default();
        projections.insert(projection.to_string(), target.clone());

        config.add_asset(AssetEntry {
            id: asset_id.to_string(),
            source: alias.clone(),
            version: constraint.to_string(),
            projections,
        });
        self.workspace.save_config(&config)?;

        let projected = self.projector.project(&root.cached, &target, root.node.artifact())?;

        Ok(InstallReport {
            source: alias,
            assets: fetched.into_iter().map(|(_, node)| node.locked).collect(),
            projection: projected,
        })
    }

    /// Re-resolves and re-fetches every configured asset.
    ///
    /// An asset with a locked commit is resolved against the manifest at that
    /// commit, falling back to the source's current state when it cannot be
    /// loaded. The lockfile is written after each asset. Only cache and
    /// lockfile failures end the run early.
    pub async fn sync(&self) -> Result<SyncReport> {
        self.reclaim_staging();
        let config = self.workspace.load_config()?;
        let lock = LockAccumulator::new(self.workspace.load_lockfile()?);
        let mut fetchers = HashMap::new();
        let mut report = SyncReport::default();

        for entry in &config.assets {
            let result = self.sync_entry(&config, entry, &lock, &mut fetchers, &mut report).await;
            lock.persist(&self.workspace).await?;

            if let Err(error) = result {
                if !is_per_asset(&error) {
                    return Err(error);
                }
                tracing::warn!("Skipping {} from {}: {error:#}", entry.id, entry.source);
                report.failures.push(SyncFailure {
                    source: entry.source.clone(),
                    id: entry.id.clone(),
                    error,
                });
            }
        }

        Ok(report)
    }

    async fn sync_entry(
        &self,
        config: &WorkspaceConfig,
        entry: &AssetEntry,
        lock: &LockAccumulator,
        fetchers: &mut HashMap<String, Fetcher>,
        report: &mut SyncReport,
    ) -> Result<()> {
        let fetcher = match fetchers.entry(entry.source.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => slot.insert(self.fetcher(config, &entry.source)?),
        };

        let pinned = lock.pinned_commit(&entry.source, &entry.id).await;
        let snapshot = load_manifest_pinned(fetcher, pinned.as_deref()).await?;
        let graph = resolve_graph(&snapshot.manifest, &entry.id, &entry.version)?;

        let progress = ProgressBar::new(graph.len() as u64, self.quiet);
        progress.set_message(format!("Syncing {}", entry.id));
        let mut results: Vec<NodeResult> = self
            .fetch_nodes(fetcher, &entry.source, &snapshot, graph.into_nodes(), &progress)
            .collect()
            .await;
        progress.finish_and_clear();
        results.sort_by_key(|r| r.index);

        let mut root = None;
        let mut failures = Vec::new();
        for NodeResult {
            id,
            result,
            ..
        } in results
        {
            match result {
                Ok(node) => {
                    lock.record(node.locked.clone()).await;
                    report.synced.push(node.locked.clone());
                    if node.node.id == entry.id {
                        root = Some(node);
                    }
                }
                Err(error) => failures.push((id, error)),
            }
        }

        for (id, error) in failures {
            if !is_per_asset(&error) {
                return Err(error);
            }
            tracing::warn!("Failed to sync {id} from {}: {error:#}", entry.source);
            report.failures.push(SyncFailure {
                source: entry.source.clone(),
                id,
                error,
            });
        }

        if let Some(root) = root {
            for (name, target) in &entry.projections {
                self.projector
                    .project(&root.cached, target, root.node.artifact())
                    .with_context(|| format!("Failed to project {} ({name})", entry.id))?;
            }
        }
        Ok(())
    }

    /// Configured assets joined with their lock entries.
    pub fn list(&self) -> Result<Vec<ListedAsset>> {
        let config = self.workspace.load_config()?;
        let lock = self.workspace.load_lockfile()?;
        Ok(listing::list_configured(&config, &lock))
    }

    /// Assets published by `source` (an alias, a local directory or a git
    /// URL). Nothing is registered.
    pub async fn list_remote(&self, source: &str) -> Result<RemoteListing> {
        let mut config = self.workspace.load_config()?;
        let alias = self.register_source(&mut config, source);
        let fetcher = self.fetcher(&config, &alias)?;
        let snapshot = fetcher.load_manifest(None).await?;

        Ok(RemoteListing {
            source: alias,
            location: fetcher.display_location(),
            revision: snapshot.revision.clone(),
            assets: listing::list_manifest(&snapshot.manifest),
        })
    }

    /// An existing alias is used as is; anything else is registered as a
    /// local source if it names a directory, else as a git URL.
    fn register_source(&self, config: &mut WorkspaceConfig, source: &str) -> String {
        if config.sources.contains_key(source) {
            return source.to_string();
        }
        let candidate = if self.workspace.resolve_local_path(source).is_dir() {
            SourceConfig::local(source)
        } else {
            SourceConfig::git(source)
        };
        config.ensure_source(candidate)
    }

    fn fetcher(&self, config: &WorkspaceConfig, alias: &str) -> Result<Fetcher> {
        let source = config.source(alias)?;
        Fetcher::for_source(alias, source, &self.workspace, self.fetch_options.clone())
    }

    fn fetch_nodes<'a>(
        &'a self,
        fetcher: &'a Fetcher,
        alias: &'a str,
        snapshot: &'a ManifestSnapshot,
        nodes: Vec<ResolvedNode>,
        progress: &'a ProgressBar,
    ) -> impl Stream<Item = NodeResult> + 'a {
        stream::iter(nodes.into_iter().enumerate())
            .map(move |(index, node)| async move {
                let id = node.id.clone();
                let result = self.fetch_node(fetcher, alias, snapshot, node).await;
                progress.inc(1);
                NodeResult {
                    index,
                    id,
                    result,
                }
            })
            .buffer_unordered(self.settings.max_parallel())
    }

    async fn fetch_node(
        &self,
        fetcher: &Fetcher,
        alias: &str,
        snapshot: &ManifestSnapshot,
        node: ResolvedNode,
    ) -> Result<FetchedNode> {
        let artifact = node.artifact();
        let staged = self.cache.begin(alias, &node.id, &node.version, artifact).await?;

        // Nodes without an explicit ref come from the revision the manifest was read at.
        let revision = node.meta.revision().unwrap_or(&snapshot.revision);
        let commit =
            fetch_artifact(fetcher, &node.meta.path, Some(revision), artifact, staged.path())
                .await
                .with_context(|| format!("Failed to fetch {}@{}", node.id, node.version))?;

        let sha256 = hash_artifact(staged.path(), artifact)?;
        let cached = staged.commit()?;
        tracing::debug!("Fetched {}@{} ({commit}) -> {}", node.id, node.version, cached.display());

        let locked = LockedAsset {
            id: node.id.clone(),
            version: node.version.clone(),
            source: alias.to_string(),
            commit,
            sha256,
            manifest_hash: Some(snapshot.sha256.clone()),
            resolved_at: Utc::now(),
        };

        Ok(FetchedNode {
            node,
            cached,
            locked,
        })
    }
}

async fn load_manifest_pinned(fetcher: &Fetcher, pinned: Option<&str>) -> Result<ManifestSnapshot> {
    if let Some(commit) = pinned {
        match fetcher.load_manifest(Some(commit)).await {
            Ok(snapshot) => return Ok(snapshot),
            Err(e) => tracing::warn!(
                "({}) Manifest at pinned revision {commit} unavailable, using current state: {e:#}",
                fetcher.alias()
            ),
        }
    }
    fetcher.load_manifest(None).await
}
