//! Smoke tests for the mrupdate binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn mrupdate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("mrupdate").unwrap();
    cmd.current_dir(dir.path()).env("CI", "true").env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_lists_update_command() {
    let dir = TempDir::new().unwrap();
    mrupdate(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("--cpu-jobs"));
}

#[test]
fn version_command_prints_name() {
    let dir = TempDir::new().unwrap();
    mrupdate(&dir)
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mrupdate"));
}

#[test]
fn update_requires_modpack_argument() {
    let dir = TempDir::new().unwrap();
    mrupdate(&dir)
        .arg("update")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<MODPACK>"));
}

#[test]
fn update_reports_missing_modpack() {
    let dir = TempDir::new().unwrap();
    mrupdate(&dir)
        .args(["update", "no-such-pack"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load modpack"));
}

#[test]
fn update_rejects_manifest_without_minecraft_version() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("modrinth.index.json"),
        r#"{"formatVersion": 1, "game": "minecraft", "name": "Broken",
            "dependencies": {}, "files": []}"#,
    )
    .unwrap();

    mrupdate(&dir)
        .args(["update", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load modpack"));

    assert!(!dir.path().join("mods").exists());
}
