//! Lockfile contents as written by install and sync.

use arca_cli::constants::MANIFEST_FILE_NAME;
use arca_cli::lockfile::checksum::hash_content;

use crate::common::{TestProject, location};

#[tokio::test]
async fn test_lockfile_is_pretty_json_with_camel_case_fields() {
    let project = TestProject::new();
    let library = project.local_source("library");
    project
        .installer()
        .install(&location(&library), "greeting", "latest", "default", None)
        .await
        .unwrap();

    let raw = project.read(".arca-assets.lock");
    assert!(raw.starts_with("{\n  \"assets\": ["));
    assert!(raw.ends_with("}\n"));

    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &value["assets"][0];
    assert_eq!(first["id"], "greeting");
    assert_eq!(first["source"], "library");
    assert!(first["resolvedAt"].is_string());

    let manifest = std::fs::read(library.path().join(MANIFEST_FILE_NAME)).unwrap();
    assert_eq!(first["manifestHash"], hash_content(&manifest).as_str());
}

#[tokio::test]
async fn test_reinstall_replaces_entries_in_place() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();

    installer.install(&location(&library), "review", "latest", "default", None).await.unwrap();
    installer.install("library", "greeting", "1.0.0", "default", None).await.unwrap();
    let before = installer.workspace().load_lockfile().unwrap();
    let order: Vec<_> = before.assets.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(order, vec!["review", "greeting", "footer"]);

    installer.install("library", "greeting", "latest", "default", None).await.unwrap();
    let after = installer.workspace().load_lockfile().unwrap();
    let order: Vec<_> = after.assets.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(order, vec!["review", "greeting", "footer"]);
    assert_eq!(after.find("library", "greeting").unwrap().version, "2.0.0");

    // The workspace config keeps one entry per asset, updated to the new constraint.
    let config = installer.workspace().load_config().unwrap();
    let greeting: Vec<_> = config.assets.iter().filter(|a| a.id == "greeting").collect();
    assert_eq!(greeting.len(), 1);
    assert_eq!(greeting[0].version, "latest");
}

#[tokio::test]
async fn test_content_hash_ignores_line_endings() {
    let project = TestProject::new();
    let library = project.local_source("library");
    let installer = project.installer();

    installer.install(&location(&library), "greeting", "2.0.0", "default", None).await.unwrap();
    let crlf = installer.workspace().load_lockfile().unwrap();

    library.write("p2.md", "Hello v2\n").unwrap();
    installer.sync().await.unwrap();
    let lf = installer.workspace().load_lockfile().unwrap();

    assert_eq!(
        crlf.find("library", "greeting").unwrap().sha256,
        lf.find("library", "greeting").unwrap().sha256
    );
}
