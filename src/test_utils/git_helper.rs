//! Git fixture helper.
//!
//! Runs the system `git` synchronously; only meant for building test
//! repositories.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    fn run(&self, args: &[&str], action: &str) -> Result<String> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{action} failed: {}", String::from_utf8_lossy(&output.stderr));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// `git init` on branch `main` with a local identity and CRLF conversion off.
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.repo_path)?;
        self.run(&["init", "--quiet"], "Failed to initialize git repository")?;
        self.run(&["symbolic-ref", "HEAD", "refs/heads/main"], "Failed to set default branch")?;
        self.run(&["config", "user.email", "test@arca.example"], "Failed to configure email")?;
        self.run(&["config", "user.name", "Test User"], "Failed to configure name")?;
        self.run(&["config", "commit.gpgsign", "false"], "Failed to disable signing")?;
        self.run(&["config", "core.autocrlf", "false"], "Failed to disable autocrlf")?;
        Ok(())
    }

    /// Stages everything and commits, returning the new commit id.
    pub fn commit_all(&self, message: &str) -> Result<String> {
        self.run(&["add", "-A"], "Failed to add files to git")?;
        self.run(&["commit", "--quiet", "-m", message], "Failed to create git commit")?;
        self.rev_parse_head()
    }

    pub fn tag(&self, tag_name: &str) -> Result<()> {
        self.run(&["tag", tag_name], &format!("Failed to create tag: {tag_name}"))?;
        Ok(())
    }

    pub fn rev_parse_head(&self) -> Result<String> {
        self.run(&["rev-parse", "HEAD"], "Failed to get current commit SHA")
    }

    /// `file://` URL of this repository.
    #[must_use]
    pub fn url(&self) -> String {
        format!("file://{}", crate::utils::normalize_path_for_storage(&self.repo_path))
    }

    #[must_use]
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}
