//! Shared, serialised access to the in-memory lockfile during a run.

use anyhow::Result;
use tokio::sync::Mutex;

use crate::config::ConfigManager;
use crate::lockfile::{LockFile, LockedAsset};

/// The lockfile being built by an install or sync.
///
/// Every mutation goes through the mutex, so concurrent node tasks can
/// record results without racing the upsert scan.
#[derive(Debug, Default)]
pub struct LockAccumulator {
    inner: Mutex<LockFile>,
}

impl LockAccumulator {
    #[must_use]
    pub fn new(lock: LockFile) -> Self {
        Self {
            inner: Mutex::new(lock),
        }
    }

    pub async fn record(&self, entry: LockedAsset) {
        self.inner.lock().await.upsert(entry);
    }

    pub async fn pinned_commit(&self, source: &str, id: &str) -> Option<String> {
        self.inner.lock().await.pinned_commit(source, id).map(str::to_string)
    }

    /// Writes the current state to the workspace lockfile.
    pub async fn persist(&self, workspace: &ConfigManager) -> Result<()> {
        let lock = self.inner.lock().await;
        workspace.save_lockfile(&lock)
    }

    pub fn into_inner(self) -> LockFile {
        self.inner.into_inner()
    }
}
