//! Transitive dependency resolution.
//!
//! [`resolve_graph`] walks a manifest breadth-first from one root request,
//! resolving every `(asset id, constraint)` pair it meets with
//! [`resolve_version`]. The visited set is keyed by asset id alone:
//!
//! - the first constraint seen for an id wins; later requests for the same id
//!   are skipped even if their constraint differs (no constraint intersection)
//! - cycles terminate because every id is resolved at most once
//!
//! Any failure aborts the traversal. Callers never see a partial graph.

use crate::core::ArcaError;
use crate::manifest::{Manifest, ManifestVersion};
use crate::models::{Artifact, AssetKind};
use crate::version::resolve_version;
use std::collections::{HashSet, VecDeque};

/// One asset id's chosen version plus what is needed to fetch it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNode {
    pub id: String,
    pub version: String,
    pub meta: ManifestVersion,
    pub kind: AssetKind,
}

impl ResolvedNode {
    #[must_use]
    pub const fn artifact(&self) -> Artifact {
        self.kind.artifact()
    }
}

/// Result of one graph resolution, in breadth-first visitation order.
///
/// The root request is always the first node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedGraph {
    nodes: Vec<ResolvedNode>,
}

impl ResolvedGraph {
    #[must_use]
    pub fn root(&self) -> Option<&ResolvedNode> {
        self.nodes.first()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ResolvedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedNode> {
        self.nodes.iter()
    }

    #[must_use]
    pub fn into_nodes(self) -> Vec<ResolvedNode> {
        self.nodes
    }
}

impl IntoIterator for ResolvedGraph {
    type Item = ResolvedNode;
    type IntoIter = std::vec::IntoIter<ResolvedNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// Resolves `root_id` at `root_constraint` and everything it depends on.
pub fn resolve_graph(
    manifest: &Manifest,
    root_id: &str,
    root_constraint: &str,
) -> Result<ResolvedGraph, ArcaError> {
    let mut queue: VecDeque<(String, String)> = VecDeque::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut nodes = Vec::new();

    queue.push_back((root_id.to_string(), root_constraint.to_string()));

    while let Some((id, constraint)) = queue.pop_front() {
        if visited.contains(&id) {
            tracing::trace!("Skipping {id}@{constraint}: already resolved");
            continue;
        }

        let resolved = resolve_version(manifest, &id, &constraint)?;
        let asset = manifest.asset(&id)?;
        tracing::debug!("Resolved {id}@{constraint} -> {}", resolved.version);

        for (dep_id, dep_constraint) in &asset.dependencies {
            queue.push_back((dep_id.clone(), dep_constraint.clone()));
        }

        visited.insert(id.clone());
        nodes.push(ResolvedNode {
            id,
            version: resolved.version,
            meta: resolved.meta,
            kind: asset.kind,
        });
    }

    Ok(ResolvedGraph {
        nodes,
    })
}
