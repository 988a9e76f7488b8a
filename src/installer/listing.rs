//! Read-only views: what the workspace has and what a source offers.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::WorkspaceConfig;
use crate::lockfile::{LockFile, LockedAsset};
use crate::manifest::Manifest;
use crate::models::AssetKind;
use crate::version::parse_version;

/// A configured asset and its lock state.
#[derive(Debug, Clone, Serialize)]
pub struct ListedAsset {
    pub id: String,
    pub source: String,
    pub constraint: String,
    pub projections: BTreeMap<String, String>,
    /// `None` until the asset has been fetched
    pub locked: Option<LockedAsset>,
}

/// An asset published by a source.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteAsset {
    pub id: String,
    pub kind: AssetKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Oldest first
    pub versions: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoteListing {
    pub source: String,
    pub location: String,
    pub revision: String,
    pub assets: Vec<RemoteAsset>,
}

/// Joins configured assets with their lock entries, in config order.
#[must_use]
pub fn list_configured(config: &WorkspaceConfig, lock: &LockFile) -> Vec<ListedAsset> {
    config
        .assets
        .iter()
        .map(|entry| ListedAsset {
            id: entry.id.clone(),
            source: entry.source.clone(),
            constraint: entry.version.clone(),
            projections: entry.projections.clone(),
            locked: lock.find(&entry.source, &entry.id).cloned(),
        })
        .collect()
}

/// Every asset of a manifest, ordered by id, with sorted versions.
#[must_use]
pub fn list_manifest(manifest: &Manifest) -> Vec<RemoteAsset> {
    manifest
        .assets
        .iter()
        .map(|(id, asset)| RemoteAsset {
            id: id.clone(),
            kind: asset.kind,
            description: asset.description.clone(),
            versions: sort_versions(asset.versions.keys().cloned().collect()),
            dependencies: asset.dependencies.clone(),
        })
        .collect()
}

/// Semantic versions in ascending order, then the remaining keys
/// lexicographically.
#[must_use]
pub fn sort_versions(mut versions: Vec<String>) -> Vec<String> {
    versions.sort_by(|a, b| match (parse_version(a), parse_version(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    });
    versions
}
