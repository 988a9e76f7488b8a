//! Installing from a local directory source.

use arca_cli::core::{ArcaError, classify};
use arca_cli::lockfile::checksum::hash_content;
use arca_cli::projector::ProjectionMode;

use crate::common::{TestProject, location};

#[tokio::test]
async fn test_install_projects_root_and_locks_dependencies() {
    let project = TestProject::new();
    let library = project.local_source("library");

    let report = project
        .installer()
        .install(&location(&library), "greeting", "latest", "default", None)
        .await
        .unwrap();

    assert_eq!(report.source, "library");
    assert_eq!(report.root().unwrap().version, "2.0.0");
    assert_eq!(
        report.projection.path,
        project.workspace().join(".arca/assets/library/greeting.md")
    );
    assert!(project.read(".arca/assets/library/greeting.md").starts_with("Hello v2"));

    let lock = project.installer().workspace().load_lockfile().unwrap();
    let footer = lock.find("library", "footer").unwrap();
    assert_eq!(footer.version, "1.0.0");
    assert_eq!(footer.commit, "local");
    assert_eq!(footer.sha256, hash_content(b"-- footer --\n"));

    // Only the requested asset is projected.
    assert!(!project.workspace().join(".arca/assets/library/footer.md").exists());
}

#[tokio::test]
async fn test_install_exact_version_and_custom_target() {
    let project = TestProject::new();
    let library = project.local_source("library");

    let report = project
        .installer()
        .install(&location(&library), "greeting", "1.0.0", "default", Some("prompts/hello.md"))
        .await
        .unwrap();

    assert_eq!(report.root().unwrap().version, "1.0.0");
    assert_eq!(project.read("prompts/hello.md"), "Hello v1\n");

    let config = project.installer().workspace().load_config().unwrap();
    let entry = &config.assets[0];
    assert_eq!(entry.version, "1.0.0");
    assert_eq!(entry.projections.get("default").map(String::as_str), Some("prompts/hello.md"));
}

#[tokio::test]
async fn test_install_skill_directory() {
    let project = TestProject::new();
    let library = project.local_source("library");

    let report = project
        .installer()
        .install(&location(&library), "review", "^0.1", "default", None)
        .await
        .unwrap();

    assert_eq!(report.assets.len(), 1);
    let projected = project.workspace().join(".arca/assets/library/review");
    assert_eq!(report.projection.path, projected);
    assert_eq!(project.read(".arca/assets/library/review/SKILL.md"), "# Review\n");
    assert_eq!(
        project.read(".arca/assets/library/review/checklists/security.md"),
        "- no secrets\n"
    );
    if report.projection.mode == ProjectionMode::Symlink {
        assert!(std::fs::symlink_metadata(&projected).unwrap().file_type().is_symlink());
    }
}

#[tokio::test]
async fn test_install_adds_gitignore_entry_once() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();

    for _ in 0..2 {
        installer
            .install(&location(&library), "greeting", "latest", "default", None)
            .await
            .unwrap();
    }

    let gitignore = project.read(".gitignore");
    assert_eq!(gitignore.matches("# ARCA managed assets").count(), 1);
    assert_eq!(gitignore.matches(".arca/assets/library/greeting.md").count(), 1);
}

#[tokio::test]
async fn test_second_install_reuses_registered_alias() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();

    installer.install(&location(&library), "greeting", "latest", "default", None).await.unwrap();
    let report = installer.install("library", "review", "latest", "default", None).await.unwrap();

    assert_eq!(report.source, "library");
    let config = installer.workspace().load_config().unwrap();
    assert_eq!(config.sources.len(), 1);
    assert_eq!(config.assets.len(), 2);
}

#[tokio::test]
async fn test_unsatisfiable_constraint_changes_nothing() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();

    let err = installer
        .install(&location(&library), "greeting", "^3.0", "default", None)
        .await
        .unwrap_err();

    assert!(matches!(classify(&err), Some(ArcaError::NoMatchingVersion { .. })));
    assert!(!installer.workspace().config_path().exists());
    assert!(!installer.workspace().lockfile_path().exists());
}

#[tokio::test]
async fn test_missing_dependency_artifact_aborts_install() {
    let project = TestProject::new();
    let library = project.local_source("library");
    library.remove("f.md").unwrap();
    let installer = project.installer();

    let err = installer
        .install(&location(&library), "greeting", "latest", "default", None)
        .await
        .unwrap_err();

    assert!(matches!(classify(&err), Some(ArcaError::PathNotFound { .. })));
    assert!(installer.workspace().load_lockfile().unwrap().is_empty());
    assert!(!project.workspace().join(".arca/assets/library/greeting.md").exists());
}
