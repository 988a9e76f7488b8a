//! Git sources over `file://` URLs.

use arca_cli::core::{ArcaError, classify};
use arca_cli::lockfile::checksum::hash_content;

use crate::common::TestProject;

#[tokio::test]
async fn test_install_from_git_records_commit() {
    let project = TestProject::new();
    let (_fixture, git) = project.git_source("library");
    let head = git.rev_parse_head().unwrap();

    let report = project
        .installer()
        .install(&git.url(), "greeting", "latest", "default", None)
        .await
        .unwrap();

    assert_eq!(report.source, "library");
    assert!(report.assets.iter().all(|a| a.commit == head));
    assert!(project.read(".arca/assets/library/greeting.md").starts_with("Hello v2"));

    let config = project.installer().workspace().load_config().unwrap();
    let source = config.source("library").unwrap();
    assert_eq!(source.location(), git.url());
}

#[tokio::test]
async fn test_sync_stays_on_locked_commit() {
    let project = TestProject::new();
    let (fixture, git) = project.git_source("library");
    let first = git.rev_parse_head().unwrap();
    let installer = project.installer();
    installer.install(&git.url(), "greeting", "latest", "default", None).await.unwrap();

    fixture.write("p2.md", "Hello v2, revised\n").unwrap();
    let second = git.commit_all("Revise greeting").unwrap();
    assert_ne!(first, second);

    let report = installer.sync().await.unwrap();
    assert!(report.is_success());

    let lock = installer.workspace().load_lockfile().unwrap();
    let greeting = lock.find("library", "greeting").unwrap();
    assert_eq!(greeting.commit, first);
    assert_eq!(greeting.sha256, hash_content(b"Hello v2\n"));
}

#[tokio::test]
async fn test_reinstall_moves_to_new_head() {
    let project = TestProject::new();
    let (fixture, git) = project.git_source("library");
    let installer = project.installer();
    installer.install(&git.url(), "greeting", "latest", "default", None).await.unwrap();

    fixture.write("p2.md", "Hello v2, revised\n").unwrap();
    let second = git.commit_all("Revise greeting").unwrap();

    let report = installer.install("library", "greeting", "latest", "default", None).await.unwrap();
    assert_eq!(report.root().unwrap().commit, second);
    assert_eq!(project.read(".arca/assets/library/greeting.md"), "Hello v2, revised\n");
}

#[tokio::test]
async fn test_version_strategy_fetches_tagged_revision() {
    let project = TestProject::new();
    let (fixture, git) = project.git_source("tagged");
    fixture
        .manifest(
            r#"schema: "1.0"
version-strategy:
  template: "v{{version}}"
assets:
  notes:
    kind: instruction
    versions:
      1.0.0:
        path: notes.md
      2.0.0:
        path: notes.md
"#,
        )
        .unwrap();
    fixture.write("notes.md", "first\n").unwrap();
    let tagged = git.commit_all("Notes 1.0.0").unwrap();
    git.tag("v1.0.0").unwrap();
    fixture.write("notes.md", "second\n").unwrap();
    git.commit_all("Notes 2.0.0").unwrap();
    git.tag("v2.0.0").unwrap();

    let report = project
        .installer()
        .install(&git.url(), "notes", "1.0.0", "default", None)
        .await
        .unwrap();

    assert_eq!(report.root().unwrap().commit, tagged);
    assert_eq!(project.read(".arca/assets/tagged/notes.md"), "first\n");
}

#[tokio::test]
async fn test_unreachable_git_source_is_reported_without_writing() {
    let project = TestProject::new();
    let missing = format!("file://{}/nowhere.git", project.path("remote").display());
    let installer = project.installer();

    let err = installer.install(&missing, "greeting", "latest", "default", None).await.unwrap_err();

    assert!(matches!(classify(&err), Some(ArcaError::SourceUnreachable { .. })));
    assert!(!installer.workspace().config_path().exists());
}
