use super::*;
use crate::modpack::hashing::sha1_hex;
use crate::primitives::GenerationMode;
use mockito::{Matcher, Server, ServerGuard};
use std::io::Read;
use tempfile::TempDir;

const NEW_JAR: &[u8] = b"lithium 1.2.0 contents";

fn update_args(modpack: &Path) -> UpdateArgs {
    UpdateArgs {
        modpack: modpack.to_path_buf(),
        client: false,
        server: false,
        overrides_folder: PathBuf::from("overrides"),
        output_dir: None,
        changelog: None,
        dry_run: false,
        json: false,
    }
}

fn config_for(server: &ServerGuard, workdir: &Path) -> AppConfig {
    AppConfig {
        workdir: Some(workdir.to_path_buf()),
        api_url: server.url(),
        ..AppConfig::default()
    }
}

fn write_manifest(dir: &Path, server: &ServerGuard) {
    let manifest = serde_json::json!({
        "formatVersion": 1,
        "game": "minecraft",
        "versionId": "1.0.0",
        "name": "Command Pack",
        "dependencies": {"minecraft": "1.21.4", "fabric-loader": "0.16.0"},
        "files": [{
            "path": "mods/lithium.jar",
            "downloads": [format!("{}/data/P1/versions/old/lithium.jar", server.url())],
            "hashes": {},
            "fileSize": 3
        }]
    });
    fs::write(dir.join("modrinth.index.json"), manifest.to_string()).unwrap();
}

async fn mock_registry(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let project = server
        .mock("GET", "/project/P1")
        .with_status(200)
        .with_body(
            serde_json::json!({
                "id": "P1",
                "slug": "lithium",
                "title": "Lithium",
                "client_side": "optional",
                "server_side": "optional"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let versions = server
        .mock("GET", "/project/P1/version")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            serde_json::json!([{
                "id": "lith-120",
                "project_id": "P1",
                "name": "Lithium 1.2.0",
                "version_number": "1.2.0",
                "game_versions": ["1.21.4"],
                "loaders": ["fabric"],
                "date_published": "2025-01-01T00:00:00Z",
                "files": [{
                    "hashes": {"sha1": sha1_hex(NEW_JAR)},
                    "url": format!("{}/cdn/lithium-1.2.0.jar", server.url()),
                    "filename": "lithium-1.2.0.jar",
                    "primary": true,
                    "size": NEW_JAR.len()
                }]
            }])
            .to_string(),
        )
        .create_async()
        .await;

    let download = server
        .mock("GET", "/cdn/lithium-1.2.0.jar")
        .with_status(200)
        .with_body(NEW_JAR)
        .create_async()
        .await;

    vec![project, versions, download]
}

#[tokio::test]
async fn test_run_update_installs_and_writes_changelog() {
    let mut server = Server::new_async().await;
    let mocks = mock_registry(&mut server).await;
    let pack = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    write_manifest(pack.path(), &server);

    let run = run_update(
        &config_for(&server, workdir.path()),
        &update_args(pack.path()),
        &NoProgress,
        &CancellationFlag::new(),
    )
    .await
    .unwrap();

    for mock in mocks {
        mock.assert_async().await;
    }
    assert_eq!(run.report.summary.updated, 1);
    assert_eq!(
        fs::read(workdir.path().join("mods/lithium.jar")).unwrap(),
        NEW_JAR
    );
    assert_eq!(
        run.changelog,
        workdir.path().join("Command_Pack_changelog.md")
    );
    let changelog = fs::read_to_string(&run.changelog).unwrap();
    assert!(changelog.contains("# Modpack Update Changelog"));
    assert!(changelog.contains("unknown -> 1.2.0"));
    assert!(run.packages.is_empty());
}

#[tokio::test]
async fn test_run_update_packages_client_and_server() {
    let mut server = Server::new_async().await;
    let _mocks = mock_registry(&mut server).await;
    let pack = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let overrides = TempDir::new().unwrap();
    fs::create_dir_all(overrides.path().join("config")).unwrap();
    fs::write(overrides.path().join("config/lithium.properties"), "x=1").unwrap();
    write_manifest(pack.path(), &server);

    let args = UpdateArgs {
        client: true,
        server: true,
        overrides_folder: overrides.path().to_path_buf(),
        output_dir: Some(output.path().to_path_buf()),
        ..update_args(pack.path())
    };

    let run = run_update(
        &config_for(&server, workdir.path()),
        &args,
        &NoProgress,
        &CancellationFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(run.packages.len(), 2);
    assert!(run.packages.iter().all(|p| p.included == 1 && p.overrides_copied));
    assert_eq!(
        run.changelog,
        output.path().join("Command_Pack_changelog.md")
    );

    let client = output
        .path()
        .join(crate::modpack::output_file_name("Command_Pack", GenerationMode::Client));
    let mut archive = zip::ZipArchive::new(fs::File::open(&client).unwrap()).unwrap();
    let mut index = String::new();
    archive
        .by_name("modrinth.index.json")
        .unwrap()
        .read_to_string(&mut index)
        .unwrap();
    let index: serde_json::Value = serde_json::from_str(&index).unwrap();
    assert_eq!(index["files"][0]["hashes"]["sha1"], sha1_hex(NEW_JAR));
    assert!(archive.by_name("overrides/config/lithium.properties").is_ok());

    assert!(output.path().join("Command_Pack-server.mrpack").is_file());
}

#[tokio::test]
async fn test_dry_run_writes_changelog_only() {
    let mut server = Server::new_async().await;
    let _mocks = mock_registry(&mut server).await;
    let pack = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    write_manifest(pack.path(), &server);

    let args = UpdateArgs {
        dry_run: true,
        client: true,
        ..update_args(pack.path())
    };

    let run = run_update(
        &config_for(&server, workdir.path()),
        &args,
        &NoProgress,
        &CancellationFlag::new(),
    )
    .await
    .unwrap();

    assert!(run.report.dry_run);
    assert!(run.packages.is_empty());
    assert!(!workdir.path().join("mods").exists());
    assert!(run.changelog.is_file());
}

#[tokio::test]
async fn test_explicit_changelog_path_creates_parents() {
    let mut server = Server::new_async().await;
    let _mocks = mock_registry(&mut server).await;
    let pack = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    write_manifest(pack.path(), &server);
    let target = workdir.path().join("notes/nested/changes.md");

    let args = UpdateArgs {
        changelog: Some(target.clone()),
        ..update_args(pack.path())
    };

    let run = run_update(
        &config_for(&server, workdir.path()),
        &args,
        &NoProgress,
        &CancellationFlag::new(),
    )
    .await
    .unwrap();

    assert_eq!(run.changelog, target);
    assert!(target.is_file());
}

#[tokio::test]
async fn test_missing_modpack_is_an_error() {
    let server = Server::new_async().await;
    let workdir = TempDir::new().unwrap();

    let result = run_update(
        &config_for(&server, workdir.path()),
        &update_args(&workdir.path().join("does-not-exist")),
        &NoProgress,
        &CancellationFlag::new(),
    )
    .await;

    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("Failed to load modpack"));
}

#[tokio::test]
async fn test_cancelled_run_skips_packaging() {
    let mut server = Server::new_async().await;
    let _mocks = mock_registry(&mut server).await;
    let pack = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_manifest(pack.path(), &server);
    let cancel = CancellationFlag::new();
    cancel.cancel();

    let args = UpdateArgs {
        client: true,
        output_dir: Some(output.path().to_path_buf()),
        ..update_args(pack.path())
    };

    let run = run_update(&config_for(&server, workdir.path()), &args, &NoProgress, &cancel)
        .await
        .unwrap();

    assert!(run.report.cancelled);
    assert!(run.packages.is_empty());
    assert!(!output.path().join("Command_Pack.mrpack").exists());
}

#[tokio::test]
async fn test_version_command_succeeds() {
    assert!(handle_version().await.is_ok());
}
