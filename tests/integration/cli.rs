//! The `arca` binary end to end.

use assert_cmd::Command;
use predicates::prelude::*;
use serial_test::serial;

use crate::common::{TestProject, location};

fn arca(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("arca").unwrap();
    cmd.arg("-C")
        .arg(project.workspace())
        .env("ARCA_CACHE_DIR", project.cache_dir())
        .env("ARCA_CONFIG_PATH", project.path("config.toml"))
        .env("ARCA_NO_PROGRESS", "1")
        .env("NO_COLOR", "1")
        .env_remove("ARCA_GIT_TOKEN")
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
#[serial]
fn test_install_then_list() {
    let project = TestProject::new();
    let library = project.local_source("library");

    arca(&project)
        .args(["install", &location(&library), "greeting"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Installed greeting@2.0.0 from library"))
        .stdout(predicate::str::contains("+ footer@1.0.0"))
        .stdout(predicate::str::contains(".arca/assets/library/greeting.md"));

    arca(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("greeting"))
        .stdout(predicate::str::contains("latest"))
        .stdout(predicate::str::contains("2.0.0"));

    let output = arca(&project).args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let listed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listed[0]["id"], "greeting");
    assert_eq!(listed[0]["locked"]["commit"], "local");
}

#[test]
#[serial]
fn test_list_on_empty_workspace() {
    let project = TestProject::new();
    arca(&project)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No assets configured"));
}

#[test]
#[serial]
fn test_list_remote_json() {
    let project = TestProject::new();
    let library = project.local_source("library");

    let output = arca(&project).args(["list-remote", &location(&library), "--json"]).output().unwrap();
    assert!(output.status.success());

    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing["source"], "library");
    let ids: Vec<_> =
        listing["assets"].as_array().unwrap().iter().map(|a| a["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["footer", "greeting", "review"]);

    // Listing does not register the source.
    assert!(!project.workspace().join(".arca-assets.yaml").exists());
}

#[test]
#[serial]
fn test_unknown_asset_suggests_closest_id() {
    let project = TestProject::new();
    let library = project.local_source("library");

    arca(&project)
        .args(["install", &location(&library), "greting"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Asset 'greting' not found"))
        .stderr(predicate::str::contains("Did you mean 'greeting'?"));
}

#[test]
#[serial]
fn test_sync_reports_partial_failure() {
    let project = TestProject::new();
    let library = project.local_source("library");

    arca(&project).args(["install", &location(&library), "greeting"]).assert().success();
    library.remove("f.md").unwrap();

    arca(&project)
        .arg("sync")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Synced greeting@2.0.0"))
        .stderr(predicate::str::contains("Failed footer from library"))
        .stderr(predicate::str::contains("1 of 2 asset(s) failed to sync"));
}

#[test]
#[serial]
fn test_cache_info_and_clean() {
    let project = TestProject::new();
    let library = project.local_source("library");
    arca(&project).args(["install", &location(&library), "review"]).assert().success();

    arca(&project)
        .args(["cache", "info"])
        .assert()
        .success()
        .stdout(predicate::str::contains(project.cache_dir().display().to_string()));

    std::fs::create_dir_all(project.cache_dir().join(".staging/entry-stale")).unwrap();
    arca(&project).args(["cache", "clean", "--staging"]).assert().success();
    assert!(!project.cache_dir().join(".staging").exists());
    assert!(project.cache_dir().join("library").exists());

    arca(&project).args(["cache", "clean"]).assert().success();
    assert!(!project.cache_dir().join("library").exists());
}

#[test]
#[serial]
fn test_quiet_install_prints_nothing() {
    let project = TestProject::new();
    let library = project.local_source("library");

    arca(&project)
        .args(["--quiet", "install", &location(&library), "greeting", "1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
