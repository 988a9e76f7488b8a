//! Directory helpers used by the cache, the fetchers and the projector.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Creates `path` and its parents. An existing directory is fine, an existing
/// file is an error.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        bail!("{} exists and is not a directory", path.display());
    }
    fs::create_dir_all(path).with_context(|| format!("Cannot create {}", path.display()))
}

/// [`ensure_dir`] for the parent of `path`, if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Copies every regular file below `src` into `dst`, keeping relative paths.
///
/// `.git` directories are not descended into; symlinks and special files are
/// skipped.
pub fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;

    let walker = WalkDir::new(src)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == ".git"));

    for entry in walker {
        let entry = entry.with_context(|| format!("Cannot walk {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let target = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Cannot copy {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

/// Deletes a directory tree. Nothing to delete is not an error.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("Cannot remove {}", path.display()))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir_twice() {
        let temp = tempdir().unwrap();
        let entry = temp.path().join("lib").join("greeting");

        ensure_dir(&entry).unwrap();
        ensure_dir(&entry).unwrap();
        assert!(entry.is_dir());
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("cache");
        std::fs::write(&blocker, "").unwrap();

        assert!(ensure_dir(&blocker).is_err());
        assert!(ensure_parent_dir(&blocker.join("entry")).is_err());
    }

    #[test]
    fn test_copy_skill_tree_without_git_metadata() {
        let temp = tempdir().unwrap();
        let skill = temp.path().join("review");
        std::fs::create_dir_all(skill.join("checklists")).unwrap();
        std::fs::create_dir_all(skill.join(".git/objects")).unwrap();
        std::fs::create_dir_all(skill.join("empty")).unwrap();
        std::fs::write(skill.join("SKILL.md"), "# Review").unwrap();
        std::fs::write(skill.join("checklists/security.md"), "- no secrets").unwrap();
        std::fs::write(skill.join(".git/HEAD"), "ref: refs/heads/main").unwrap();

        let copy = temp.path().join("copy");
        copy_dir(&skill, &copy).unwrap();

        assert_eq!(std::fs::read_to_string(copy.join("SKILL.md")).unwrap(), "# Review");
        assert_eq!(
            std::fs::read_to_string(copy.join("checklists/security.md")).unwrap(),
            "- no secrets"
        );
        assert!(copy.join("empty").is_dir());
        assert!(!copy.join(".git").exists());
    }

    #[test]
    fn test_remove_absent_tree() {
        let temp = tempdir().unwrap();
        remove_dir_all(&temp.path().join("never-created")).unwrap();
    }
}
