//! Source manifest (`arca-manifest.yaml`) model and parsing.
//!
//! A manifest is authored by an asset publisher and lives at the root of a
//! source. It declares every asset the source offers, the versions of each
//! asset, where each version's content lives inside the source, and which other
//! assets a version depends on.
//!
//! ```yaml
//! schema: "1.0"
//! version-strategy:
//!   template: "v{{version}}"
//! assets:
//!   greeting:
//!     kind: prompt
//!     description: Friendly opener
//!     versions:
//!       1.0.0:
//!         path: prompts/greeting-v1.md
//!       2.0.0:
//!         path: prompts/greeting-v2.md
//!         ref: release-2
//!     dependencies:
//!       footer: ^1.0.0
//! ```
//!
//! Manifests are read-only to ARCA. Maps are kept ordered so traversal of
//! assets, versions and dependencies is stable across runs.

use crate::core::ArcaError;
use crate::models::{AssetKind, AssetRuntime};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Parsed contents of an `arca-manifest.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub schema: String,

    /// Template used to synthesize a revision for versions without `ref`.
    #[serde(rename = "version-strategy", default, skip_serializing_if = "Option::is_none")]
    pub version_strategy: Option<VersionStrategy>,

    #[serde(default)]
    pub assets: BTreeMap<String, ManifestAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionStrategy {
    /// Revision template containing `{{version}}`, e.g. `v{{version}}`.
    pub template: String,
}

/// One asset offered by a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub kind: AssetKind,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default)]
    pub versions: BTreeMap<String, ManifestVersion>,

    /// Dependency asset id to version constraint. An empty constraint means
    /// `latest`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
}

/// Where one version of an asset lives inside its source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestVersion {
    /// Source-relative path to the file or directory.
    pub path: String,

    /// Explicit commit, branch or tag holding this version.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<AssetRuntime>,
}

impl ManifestVersion {
    /// The revision to fetch, if one is known.
    #[must_use]
    pub fn revision(&self) -> Option<&str> {
        self.reference.as_deref().filter(|r| !r.is_empty())
    }
}

impl Manifest {
    /// Parses manifest YAML. `origin` names the file in error messages.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| {
            ArcaError::ManifestParseError {
                file: origin.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Reads and parses a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Looks up an asset, failing with [`ArcaError::AssetNotFound`].
    pub fn asset(&self, id: &str) -> Result<&ManifestAsset, ArcaError> {
        self.assets.get(id).ok_or_else(|| ArcaError::AssetNotFound {
            id: id.to_string(),
            available: self.assets.keys().cloned().collect(),
        })
    }

    /// The revision template, ignoring an empty one.
    #[must_use]
    pub fn version_template(&self) -> Option<&str> {
        self.version_strategy.as_ref().map(|s| s.template.as_str()).filter(|t| !t.is_empty())
    }
}
