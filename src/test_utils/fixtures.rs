//! Source directory fixtures.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::constants::MANIFEST_FILE_NAME;

/// Manifest with a `greeting` prompt whose 2.0.0 depends on `footer`, plus a
/// `review` skill bundle.
pub const GREETING_MANIFEST: &str = r#"schema: "1.0"
assets:
  greeting:
    kind: prompt
    description: Friendly opener
    versions:
      1.0.0:
        path: p1.md
      2.0.0:
        path: p2.md
    dependencies:
      footer: ^1.0.0
  footer:
    kind: prompt
    versions:
      1.0.0:
        path: f.md
  review:
    kind: skill
    description: Code review checklist
    versions:
      0.1.0:
        path: skills/review
"#;

/// A source directory on disk: a manifest plus the files it points at.
pub struct SourceFixture {
    root: PathBuf,
}

impl SourceFixture {
    /// Uses `root` (created if needed) as the source directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
        })
    }

    /// The standard greeting/footer/review source.
    pub fn greeting(root: impl Into<PathBuf>) -> Result<Self> {
        let fixture = Self::new(root)?;
        fixture.manifest(GREETING_MANIFEST)?;
        fixture.write("p1.md", "Hello v1\n")?;
        fixture.write("p2.md", "Hello v2\r\n")?;
        fixture.write("f.md", "-- footer --\n")?;
        fixture.write("skills/review/SKILL.md", "# Review\n")?;
        fixture.write("skills/review/checklists/security.md", "- no secrets\n")?;
        Ok(fixture)
    }

    pub fn manifest(&self, yaml: &str) -> Result<()> {
        self.write(MANIFEST_FILE_NAME, yaml)
    }

    /// Writes `content` at a source-relative path, creating parents.
    pub fn write(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn remove(&self, relative: &str) -> Result<()> {
        let path = self.root.join(relative);
        if path.is_dir() {
            std::fs::remove_dir_all(path)?;
        } else {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }
}
