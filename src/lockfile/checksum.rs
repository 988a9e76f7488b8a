//! Integrity digests for fetched artifacts.
//!
//! Digests are lowercase hex SHA-256 and must agree across machines, so
//! content is hashed with every CRLF rewritten to LF, and directory trees
//! are hashed over forward-slash relative paths in sorted order.
//!
//! Tree algorithm:
//!
//! 1. Walk the root recursively, keeping regular files only
//! 2. Normalise each root-relative path to forward slashes
//! 3. Sort the paths lexicographically
//! 4. For each path feed the hasher the path bytes, then the LF-normalised content

use crate::models::Artifact;
use crate::utils::normalize_path_for_storage;
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Rewrites every CRLF pair to LF. Lone CR bytes are kept.
#[must_use]
pub fn normalize_lf(content: &[u8]) -> Cow<'_, [u8]> {
    if !content.windows(2).any(|w| w == b"\r\n") {
        return Cow::Borrowed(content);
    }

    let mut out = Vec::with_capacity(content.len());
    let mut bytes = content.iter().peekable();
    while let Some(&b) = bytes.next() {
        if b == b'\r' && bytes.peek() == Some(&&b'\n') {
            continue;
        }
        out.push(b);
    }
    Cow::Owned(out)
}

/// Digest of a byte sequence after LF normalisation.
#[must_use]
pub fn hash_content(content: &[u8]) -> String {
    hex::encode(Sha256::digest(normalize_lf(content)))
}

/// Digest of one file's content.
pub fn hash_file(path: &Path) -> Result<String> {
    let content = fs::read(path)
        .with_context(|| format!("Cannot read file for checksum calculation: {}", path.display()))?;
    Ok(hash_content(&content))
}

/// Digest of a whole directory tree.
pub fn hash_tree(root: &Path) -> Result<String> {
    let mut files: Vec<(String, std::path::PathBuf)> = Vec::new();

    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry
            .with_context(|| format!("Failed to read directory entry in: {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        files.push((normalize_path_for_storage(relative), entry.path().to_path_buf()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));

    let mut hasher = Sha256::new();
    for (relative, path) in &files {
        let content = fs::read(path)
            .with_context(|| format!("Cannot read file for checksum calculation: {}", path.display()))?;
        hasher.update(relative.as_bytes());
        hasher.update(normalize_lf(&content));
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Digest of a cached artifact, dispatching on its shape.
pub fn hash_artifact(path: &Path, artifact: Artifact) -> Result<String> {
    match artifact {
        Artifact::File => hash_file(path),
        Artifact::Directory => hash_tree(path),
    }
}
