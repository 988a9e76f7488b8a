//! One broken asset must not stop the others from syncing.

use arca_cli::core::{ArcaError, classify};
use arca_cli::lockfile::checksum::hash_content;

use crate::common::{TestProject, location};

#[tokio::test]
async fn test_sync_refreshes_projection_after_workspace_loss() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();
    installer.install(&location(&library), "greeting", "latest", "default", None).await.unwrap();

    std::fs::remove_dir_all(project.workspace().join(".arca")).unwrap();
    std::fs::remove_dir_all(project.cache_dir()).unwrap();

    let report = installer.sync().await.unwrap();
    assert!(report.is_success());
    let synced: Vec<_> = report.synced.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(synced, vec!["greeting", "footer"]);
    assert!(project.read(".arca/assets/library/greeting.md").starts_with("Hello v2"));
}

#[tokio::test]
async fn test_sync_keeps_going_when_a_dependency_disappears() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();
    installer.install(&location(&library), "greeting", "latest", "default", None).await.unwrap();
    installer.install("library", "review", "latest", "default", None).await.unwrap();

    library.remove("f.md").unwrap();
    library.write("skills/review/SKILL.md", "# Review v2\n").unwrap();

    let report = installer.sync().await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].id, "footer");
    assert!(matches!(classify(&report.failures[0].error), Some(ArcaError::PathNotFound { .. })));

    let synced: Vec<_> = report.synced.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(synced, vec!["greeting", "review"]);

    let lock = installer.workspace().load_lockfile().unwrap();
    assert_eq!(lock.find("library", "review").unwrap().sha256, hash_content(b"# Review v2\n"));
    // The failed node keeps its previous entry.
    assert_eq!(lock.find("library", "footer").unwrap().sha256, hash_content(b"-- footer --\n"));
}

#[tokio::test]
async fn test_sync_isolates_unreachable_source() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let vanishing = project.local_source("vanishing");
    let installer = project.installer();
    installer.install(&location(&vanishing), "greeting", "1.0.0", "default", None).await.unwrap();
    installer.install(&location(&library), "review", "latest", "default", None).await.unwrap();

    std::fs::remove_dir_all(vanishing.path()).unwrap();

    let report = installer.sync().await.unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].source, "vanishing");
    assert!(matches!(
        classify(&report.failures[0].error),
        Some(ArcaError::SourceUnreachable { .. })
    ));
    assert_eq!(report.synced.len(), 1);
    assert_eq!(report.synced[0].id, "review");
}

#[tokio::test]
async fn test_sync_with_corrupt_lockfile_fails_without_rewriting_it() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();
    installer.install(&location(&library), "greeting", "latest", "default", None).await.unwrap();

    let lock_path = installer.workspace().lockfile_path();
    std::fs::write(&lock_path, "{ not json").unwrap();

    let err = installer.sync().await.unwrap_err();
    assert!(matches!(classify(&err), Some(ArcaError::LockfileCorrupt { .. })));
    assert_eq!(std::fs::read_to_string(&lock_path).unwrap(), "{ not json");
}

#[tokio::test]
async fn test_sync_empty_workspace_is_a_no_op() {
    let project = TestProject::new();
    let report = project.installer().sync().await.unwrap();
    assert!(report.is_success());
    assert!(report.synced.is_empty());
    assert!(!project.workspace().join(".arca-assets.lock").exists());
}
