//! Lockfile model and reconciliation.
//!
//! The lockfile (`.arca-assets.lock`) records exactly which version, revision
//! and content digest was last fetched for each `(source alias, asset id)`
//! pair. It is JSON so that it diffs cleanly and is never hand-edited:
//!
//! ```json
//! {
//!   "assets": [
//!     {
//!       "id": "greeting",
//!       "version": "2.0.0",
//!       "source": "prompt-library",
//!       "commit": "9f1c2e4...",
//!       "sha256": "2cf24dba5fb0a30e...",
//!       "resolvedAt": "2026-10-19T08:30:00Z"
//!     }
//!   ]
//! }
//! ```
//!
//! [`LockFile::upsert`] is the only mutation path: an entry for an existing
//! pair is replaced in place, anything else is appended.

pub mod checksum;
mod io;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Durable record of every fetched asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    #[serde(default)]
    pub assets: Vec<LockedAsset>,
}

/// One fetched asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedAsset {
    pub id: String,
    pub version: String,
    /// Source alias from the workspace configuration
    pub source: String,
    /// Commit the content was read from, or `local`
    pub commit: String,
    pub sha256: String,
    /// Digest of the manifest the version was resolved from
    #[serde(rename = "manifestHash", default, skip_serializing_if = "Option::is_none")]
    pub manifest_hash: Option<String>,
    #[serde(rename = "resolvedAt")]
    pub resolved_at: DateTime<Utc>,
}

impl LockFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry`, replacing an existing entry for the same
    /// `(source, id)` in place. New pairs are appended.
    pub fn upsert(&mut self, entry: LockedAsset) {
        match self.assets.iter_mut().find(|a| a.source == entry.source && a.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.assets.push(entry),
        }
    }

    /// Locked entry for `(source, id)`, if any.
    #[must_use]
    pub fn find(&self, source: &str, id: &str) -> Option<&LockedAsset> {
        self.assets.iter().find(|a| a.source == source && a.id == id)
    }

    /// Commit to pin a re-resolution of `(source, id)` to.
    ///
    /// Local entries carry no usable revision and yield `None`.
    #[must_use]
    pub fn pinned_commit(&self, source: &str, id: &str) -> Option<&str> {
        self.find(source, id)
            .map(|a| a.commit.as_str())
            .filter(|c| !c.is_empty() && *c != crate::constants::LOCAL_REVISION)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
