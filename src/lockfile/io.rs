//! Loading and saving the lockfile.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use super::LockFile;
use crate::core::ArcaError;
use crate::utils::fs::atomic_write;

impl LockFile {
    /// Loads the lockfile at `path`.
    ///
    /// A missing or blank file is an empty lockfile. Unparseable content is
    /// [`ArcaError::LockfileCorrupt`] carrying the parser's message; it is
    /// never replaced silently.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Cannot read lockfile: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            ArcaError::LockfileCorrupt {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// Writes the lockfile as two-space indented JSON, atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut content =
            serde_json::to_string_pretty(self).context("Failed to serialize lockfile")?;
        content.push('\n');

        atomic_write(path, content.as_bytes())
            .with_context(|| format!("Cannot write lockfile: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lockfile::LockedAsset;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    #[test]
    fn test_missing_and_blank_load_empty() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".arca-assets.lock");
        assert!(LockFile::load(&path).unwrap().is_empty());

        std::fs::write(&path, "  \n").unwrap();
        assert!(LockFile::load(&path).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".arca-assets.lock");

        let mut lock = LockFile::new();
        lock.upsert(LockedAsset {
            id: "greeting".into(),
            version: "2.0.0".into(),
            source: "library".into(),
            commit: "local".into(),
            sha256: "ab".repeat(32),
            manifest_hash: Some("cd".repeat(32)),
            resolved_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        });
        lock.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.starts_with("{\n  \"assets\": ["));
        assert!(raw.contains("\"resolvedAt\": \"2026-01-02T03:04:05Z\""));

        assert_eq!(LockFile::load(&path).unwrap(), lock);
    }

    #[test]
    fn test_corrupt_lockfile_is_reported() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(".arca-assets.lock");
        std::fs::write(&path, "{ \"assets\": [ { \"id\": ").unwrap();

        let err = LockFile::load(&path).unwrap_err();
        match err.downcast_ref::<ArcaError>() {
            Some(ArcaError::LockfileCorrupt { reason, .. }) => assert!(reason.contains("EOF")),
            other => panic!("unexpected: {other:?}"),
        }
        // The corrupt file is left for the user to inspect.
        assert!(path.exists());
    }
}
