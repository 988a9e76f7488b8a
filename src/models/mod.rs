//! Shared data models for ARCA operations
//!
//! Small value types that several pipeline stages agree on: the asset kind a
//! publisher declares, the kind of source an asset comes from, and the shape of
//! the artifact that flows through fetch, cache and hashing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The kind of asset a publisher declares in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// A single prompt file
    Prompt,
    /// A directory bundle
    Skill,
    /// A single instruction file
    Instruction,
}

impl AssetKind {
    /// The artifact shape this kind is fetched, cached and hashed as.
    #[must_use]
    pub const fn artifact(self) -> Artifact {
        match self {
            Self::Skill => Artifact::Directory,
            Self::Prompt | Self::Instruction => Artifact::File,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt => write!(f, "prompt"),
            Self::Skill => write!(f, "skill"),
            Self::Instruction => write!(f, "instruction"),
        }
    }
}

/// Where a source's content lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A remote (or `file://`) git repository
    Git,
    /// A directory on the local filesystem
    Local,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Git => write!(f, "git"),
            Self::Local => write!(f, "local"),
        }
    }
}

/// Shape of a fetched artifact.
///
/// Threaded through the fetcher, the cache and the hasher instead of a
/// repeated "is directory" flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Artifact {
    /// One file, cached as `<asset-id>.md`
    File,
    /// A directory tree, cached as the entry directory itself
    Directory,
}

/// Runtime hints a publisher attaches to a version.
///
/// Carried through resolution untouched; unknown keys are preserved in
/// [`AssetRuntime::extra`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetRuntime {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub llm: Vec<LlmTarget>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_context_tokens: Option<u64>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_tools: bool,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// A model family an asset was written for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmTarget {
    pub provider: String,
    #[serde(default)]
    pub models: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_is_directory() {
        assert_eq!(AssetKind::Skill.artifact(), Artifact::Directory);
        assert_eq!(AssetKind::Prompt.artifact(), Artifact::File);
        assert_eq!(AssetKind::Instruction.artifact(), Artifact::File);
    }

    #[test]
    fn test_kind_serde_is_lowercase() {
        let kind: AssetKind = serde_yaml::from_str("instruction").unwrap();
        assert_eq!(kind, AssetKind::Instruction);
        assert_eq!(serde_yaml::to_string(&SourceKind::Git).unwrap().trim(), "git");
    }

    #[test]
    fn test_runtime_preserves_unknown_keys() {
        let yaml = "llm:\n  - provider: openai\n    models: [gpt-4o]\nrequires_tools: true\ntemperature: 0.2\n";
        let runtime: AssetRuntime = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(runtime.llm[0].provider, "openai");
        assert!(runtime.requires_tools);
        assert!(runtime.extra.contains_key("temperature"));

        let again: AssetRuntime =
            serde_yaml::from_str(&serde_yaml::to_string(&runtime).unwrap()).unwrap();
        assert_eq!(again, runtime);
    }
}
