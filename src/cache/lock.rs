//! Per-entry advisory locks for the cache.
//!
//! Each `(source alias, asset id, version)` tuple gets its own lock file under
//! `<root>/.locks/<alias>/<id>/<version>.lock`. Holding the [`EntryLock`]
//! serialises writers of that entry across tasks and processes; readers of
//! other entries are unaffected. The lock is released when the value drops.
//!
//! Lock files are left in place after release. Deleting them would let a
//! waiter lock an unlinked inode while a newcomer locks a fresh file.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_retry::strategy::ExponentialBackoff;
use tracing::debug;

use crate::constants::{MAX_BACKOFF_DELAY_MS, STARTING_BACKOFF_DELAY_MS};
use crate::core::ArcaError;

/// Exclusive lock on one cache entry.
#[derive(Debug)]
pub struct EntryLock {
    _file: Arc<File>,
    path: PathBuf,
}

impl EntryLock {
    /// Acquires the lock at `lock_path`, polling with exponential backoff until
    /// `timeout` elapses.
    pub async fn acquire(lock_path: &Path, timeout: Duration) -> Result<Self> {
        let start = Instant::now();

        if let Some(parent) = lock_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| ArcaError::CacheUnwritable {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let open_path = lock_path.to_path_buf();
        let file = tokio::task::spawn_blocking(move || {
            OpenOptions::new().create(true).write(true).truncate(false).open(&open_path)
        })
        .await
        .context("spawn_blocking panicked")?
        .map_err(|e| ArcaError::CacheUnwritable {
            path: lock_path.display().to_string(),
            reason: e.to_string(),
        })?;
        let file = Arc::new(file);

        let backoff = ExponentialBackoff::from_millis(STARTING_BACKOFF_DELAY_MS)
            .max_delay(Duration::from_millis(MAX_BACKOFF_DELAY_MS));

        for delay in backoff {
            let candidate = Arc::clone(&file);
            let locked = tokio::task::spawn_blocking(move || candidate.try_lock_exclusive())
                .await
                .context("spawn_blocking panicked")?;

            if let Ok(true) = locked {
                debug!(
                    lock = %lock_path.display(),
                    wait_ms = start.elapsed().as_millis(),
                    "Cache entry lock acquired"
                );
                return Ok(Self {
                    _file: file,
                    path: lock_path.to_path_buf(),
                });
            }

            let remaining = timeout.saturating_sub(start.elapsed());
            if remaining.is_zero() {
                return Err(anyhow::anyhow!(
                    "Timeout acquiring cache lock {} after {:?}",
                    lock_path.display(),
                    timeout
                ));
            }
            tokio::time::sleep(delay.min(remaining)).await;
        }

        Err(anyhow::anyhow!("Timeout acquiring cache lock {}", lock_path.display()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
