//! Shared setup for integration tests.

use arca_cli::cache::Cache;
use arca_cli::config::GlobalSettings;
use arca_cli::installer::Installer;
use arca_cli::source::{Anonymous, FetchOptions};
use arca_cli::test_utils::{SourceFixture, TestGit};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary workspace, cache and source library.
pub struct TestProject {
    temp: TempDir,
    workspace: PathBuf,
    cache_dir: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        arca_cli::test_utils::init_test_logging(None);
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().join("workspace");
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&workspace).unwrap();
        Self {
            temp,
            workspace,
            cache_dir,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// A scratch path next to the workspace.
    pub fn path(&self, name: &str) -> PathBuf {
        self.temp.path().join(name)
    }

    /// The greeting source as a plain directory named `name`.
    pub fn local_source(&self, name: &str) -> SourceFixture {
        SourceFixture::greeting(self.path(name)).unwrap()
    }

    /// The greeting source committed into a git repository named `name`.
    pub fn git_source(&self, name: &str) -> (SourceFixture, TestGit) {
        let fixture = self.local_source(name);
        let git = TestGit::new(fixture.path());
        git.init().unwrap();
        git.commit_all("Initial assets").unwrap();
        (fixture, git)
    }

    pub fn installer(&self) -> Installer {
        Installer::new(&self.workspace, Cache::with_root(&self.cache_dir), GlobalSettings::default())
            .with_fetch_options(FetchOptions::default().with_credentials(Arc::new(Anonymous)))
            .quiet(true)
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.workspace.join(relative)).unwrap()
    }
}

/// Source argument for a directory fixture.
pub fn location(fixture: &SourceFixture) -> String {
    fixture.path().display().to_string()
}
