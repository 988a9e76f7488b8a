//! Crash-safe file replacement.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use super::dirs::ensure_parent_dir;

/// Replaces `path` with `content` so that readers observe either the previous
/// file or the complete new one, never a prefix.
///
/// The content goes to a uniquely named temp file in the same directory,
/// is flushed to disk and then renamed over `path`. Two processes writing the
/// same file concurrently each rename a complete file; the last rename wins.
/// Missing parent directories are created.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("Cannot stage a write in {}", dir.display()))?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_all())
        .with_context(|| format!("Cannot stage new content for {}", path.display()))?;

    staged
        .persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Cannot replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_replaces_existing_content() {
        let temp = tempdir().unwrap();
        let lock = temp.path().join(".arca-assets.lock");

        atomic_write(&lock, b"{\"assets\": []}").unwrap();
        atomic_write(&lock, b"{}").unwrap();
        assert_eq!(std::fs::read_to_string(&lock).unwrap(), "{}");
    }

    #[test]
    fn test_creates_parents_and_cleans_up() {
        let temp = tempdir().unwrap();
        let config = temp.path().join("ws").join("nested").join(".arca-assets.yaml");

        atomic_write(&config, b"schema: '1.0'\n").unwrap();

        let names: Vec<_> = std::fs::read_dir(config.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from(".arca-assets.yaml")]);
    }

    #[test]
    fn test_target_that_is_a_directory_fails() {
        let temp = tempdir().unwrap();
        let blocked = temp.path().join("blocked");
        std::fs::create_dir_all(blocked.join("inner")).unwrap();

        assert!(atomic_write(&blocked, b"data").is_err());
    }
}
