use super::*;
use crate::api::{MockModrinthClient, Project, Version, VersionFile};
use crate::engine::progress::{ChannelProgress, NoProgress};
use crate::engine::report::OutcomeKind;
use crate::networking::NetworkingConfig;
use crate::modpack::{PackageOptions, build_index};
use crate::primitives::{GenerationMode, SideRequirement};
use chrono::{TimeZone, Utc};
use std::fs;
use tempfile::TempDir;

const NEW_JAR: &[u8] = b"lithium 1.2.0";

fn lithium_version() -> Version {
    Version {
        id: "lith-120".to_string(),
        project_id: "P1".to_string(),
        name: "Lithium 1.2.0".to_string(),
        version_number: "1.2.0".to_string(),
        changelog: None,
        game_versions: vec!["1.21.4".to_string()],
        loaders: vec!["fabric".to_string()],
        date_published: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        files: vec![VersionFile {
            hashes: FileHashes {
                sha1: hashing::sha1_hex(NEW_JAR),
                sha512: None,
            },
            url: "https://cdn.test/lithium-1.2.0.jar".to_string(),
            filename: "lithium-1.2.0.jar".to_string(),
            primary: true,
            size: NEW_JAR.len() as u64,
        }],
    }
}

async fn registry() -> MockModrinthClient {
    MockModrinthClient::new()
        .with_project(Project {
            id: "P1".to_string(),
            slug: "lithium".to_string(),
            title: "Lithium".to_string(),
            client_side: SideRequirement::Optional,
            server_side: SideRequirement::Optional,
        })
        .await
        .with_versions("P1", vec![lithium_version()])
        .await
        .with_hash(&hashing::sha1_hex(NEW_JAR), lithium_version())
        .await
        .with_download("https://cdn.test/lithium-1.2.0.jar", Ok(NEW_JAR.to_vec()))
        .await
}

fn write_pack(dir: &std::path::Path, files: serde_json::Value) -> Modpack {
    let manifest = serde_json::json!({
        "formatVersion": 1,
        "game": "minecraft",
        "name": "Test Pack",
        "dependencies": {"minecraft": "1.21.4", "fabric-loader": "0.16.0"},
        "files": files,
    });
    fs::write(dir.join("modrinth.index.json"), manifest.to_string()).unwrap();
    Modpack::load(dir).unwrap()
}

fn engine(client: MockModrinthClient) -> UpdateEngine<MockModrinthClient> {
    let networking = NetworkingManager::new(NetworkingConfig::default()).unwrap();
    UpdateEngine::new(Arc::new(client), networking)
}

fn lithium_entry() -> serde_json::Value {
    serde_json::json!({
        "path": "mods/lithium.jar",
        "downloads": ["https://cdn.modrinth.com/data/P1/versions/old/lithium.jar"],
        "hashes": {}
    })
}

#[tokio::test]
async fn test_new_mod_is_installed_as_update_from_unknown() {
    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(pack_dir.path(), serde_json::json!([lithium_entry()]));
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };

    let report = engine(registry().await)
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    match &report.outcomes[0].outcome {
        ResolutionOutcome::Updated {
            old_version,
            new_version,
            ..
        } => {
            assert_eq!(old_version, "unknown");
            assert_eq!(new_version, "1.2.0");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        fs::read(workdir.path().join("mods/lithium.jar")).unwrap(),
        NEW_JAR
    );
    assert!(!workdir.path().join("mods").join(".mrupdate-staging").exists());
}

#[tokio::test]
async fn test_second_run_settles_to_up_to_date() {
    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(pack_dir.path(), serde_json::json!([lithium_entry()]));
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };
    let engine = engine(registry().await);

    engine
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();
    let second = engine
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(second.summary.updated, 0);
    assert_eq!(second.summary.up_to_date, 1);
}

#[tokio::test]
async fn test_dry_run_touches_nothing() {
    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(pack_dir.path(), serde_json::json!([lithium_entry()]));
    let client = registry().await;
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: true,
    };

    let engine = engine(client);
    let report = engine
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();

    assert!(report.dry_run);
    assert_eq!(report.summary.updated, 1);
    assert!(!workdir.path().join("mods").exists());
    assert!(engine.client().downloaded_urls().await.is_empty());
}

#[tokio::test]
async fn test_entry_without_url_or_hash_is_unresolved() {
    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(
        pack_dir.path(),
        serde_json::json!([{"path": "mods/mystery.jar", "downloads": [], "hashes": {}}]),
    );
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };

    let report = engine(MockModrinthClient::new())
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].outcome.kind(), OutcomeKind::Unresolved);
}

#[tokio::test]
async fn test_cancelled_before_start_returns_partial_report() {
    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(
        pack_dir.path(),
        serde_json::json!([lithium_entry(), lithium_entry()]),
    );
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };
    let cancel = CancellationFlag::new();
    cancel.cancel();
    let (sink, mut events) = ChannelProgress::channel();

    let report = engine(registry().await)
        .run(&modpack, &options, &sink, &cancel)
        .await
        .unwrap();

    assert!(report.cancelled);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.total_entries, 2);

    assert_eq!(events.recv().await, Some(ProgressEvent::RunStarted { total: 2 }));
    assert_eq!(
        events.recv().await,
        Some(ProgressEvent::Cancelled {
            processed: 0,
            total: 2
        })
    );
}

#[tokio::test]
async fn test_progress_events_bracket_each_mod() {
    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(pack_dir.path(), serde_json::json!([lithium_entry()]));
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };
    let (sink, mut events) = ChannelProgress::channel();

    engine(registry().await)
        .run(&modpack, &options, &sink, &CancellationFlag::new())
        .await
        .unwrap();
    drop(sink);

    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
        received.push(event);
    }

    assert_eq!(received.len(), 4);
    assert!(matches!(received[1], ProgressEvent::ModStarted { index: 0, .. }));
    assert!(matches!(
        received[2],
        ProgressEvent::ModFinished {
            kind: OutcomeKind::Updated,
            ..
        }
    ));
    assert!(matches!(received[3], ProgressEvent::RunFinished { updated: 1, .. }));
}

#[tokio::test]
async fn test_settled_update_packages_installed_version() {
    const OLD_JAR: &[u8] = b"lithium 1.0.0";
    let old_url = "https://cdn.modrinth.com/data/P1/versions/old/lithium.jar";
    let mut old_version = lithium_version();
    old_version.id = "lith-100".to_string();
    old_version.version_number = "1.0.0".to_string();
    old_version.date_published = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    old_version.files[0].hashes.sha1 = hashing::sha1_hex(OLD_JAR);
    old_version.files[0].url = old_url.to_string();

    let client = registry()
        .await
        .with_hash(&hashing::sha1_hex(OLD_JAR), old_version.clone())
        .await
        .with_versions("P1", vec![old_version, lithium_version()])
        .await;

    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(
        pack_dir.path(),
        serde_json::json!([{
            "path": "mods/lithium.jar",
            "downloads": [old_url],
            "hashes": {"sha1": hashing::sha1_hex(OLD_JAR)}
        }]),
    );
    fs::create_dir_all(workdir.path().join("mods")).unwrap();
    fs::write(workdir.path().join("mods/lithium.jar"), OLD_JAR).unwrap();
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };
    let engine = engine(client);

    let first = engine
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();
    let second = engine
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(first.outcomes[0].outcome.kind(), OutcomeKind::Updated);
    assert_eq!(second.outcomes[0].outcome.kind(), OutcomeKind::UpToDate);
    assert_eq!(
        fs::read(workdir.path().join("mods/lithium.jar")).unwrap(),
        NEW_JAR
    );

    let package = PackageOptions {
        mode: GenerationMode::Client,
        pack_name: "Test_Pack".to_string(),
        output_dir: workdir.path().join("dist"),
        overrides_dir: workdir.path().join("overrides"),
        extras_dir: workdir.path().to_path_buf(),
        mods_dir: workdir.path().join("mods"),
    };
    let (index, _) = build_index(&modpack.manifest, &second, &package);

    assert_eq!(index.files.len(), 1);
    assert_eq!(index.files[0].path, "mods/lithium.jar");
    assert_eq!(
        index.files[0].downloads,
        vec!["https://cdn.test/lithium-1.2.0.jar"]
    );
    assert_eq!(
        index.files[0].hashes.sha1.as_deref(),
        Some(hashing::sha1_hex(NEW_JAR).as_str())
    );
}

#[tokio::test]
async fn test_restored_mod_is_packaged_from_manifest() {
    let new_sha1 = hashing::sha1_hex(NEW_JAR);
    let manifest_url = "https://cdn.modrinth.com/data/P1/versions/lith-120/lithium.jar";
    let client = registry()
        .await
        .with_download(manifest_url, Ok(NEW_JAR.to_vec()))
        .await;

    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(
        pack_dir.path(),
        serde_json::json!([{
            "path": "mods/lithium.jar",
            "downloads": [manifest_url],
            "hashes": {"sha1": new_sha1}
        }]),
    );
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };

    let report = engine(client)
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();

    match &report.outcomes[0].outcome {
        ResolutionOutcome::UpToDate { installed_file, .. } => assert!(installed_file.is_none()),
        other => panic!("unexpected outcome: {other:?}"),
    }

    let package = PackageOptions {
        mode: GenerationMode::Client,
        pack_name: "Test_Pack".to_string(),
        output_dir: workdir.path().join("dist"),
        overrides_dir: workdir.path().join("overrides"),
        extras_dir: workdir.path().to_path_buf(),
        mods_dir: workdir.path().join("mods"),
    };
    let (index, _) = build_index(&modpack.manifest, &report, &package);

    assert_eq!(index.files[0].downloads, vec![manifest_url]);
    assert_eq!(index.files[0].hashes.sha1.as_deref(), Some(new_sha1.as_str()));
}

#[tokio::test]
async fn test_failed_hash_lookup_resolves_by_download_url() {
    const OLD_JAR: &[u8] = b"lithium 1.0.0";
    let client = registry()
        .await
        .with_hash_error(&hashing::sha1_hex(OLD_JAR), "connection reset")
        .await;

    let pack_dir = TempDir::new().unwrap();
    let workdir = TempDir::new().unwrap();
    let modpack = write_pack(pack_dir.path(), serde_json::json!([lithium_entry()]));
    fs::create_dir_all(workdir.path().join("mods")).unwrap();
    fs::write(workdir.path().join("mods/lithium.jar"), OLD_JAR).unwrap();
    let options = RunOptions {
        workdir: workdir.path().to_path_buf(),
        dry_run: false,
    };

    let report = engine(client)
        .run(&modpack, &options, &NoProgress, &CancellationFlag::new())
        .await
        .unwrap();

    assert_eq!(report.outcomes[0].outcome.kind(), OutcomeKind::Updated);
    assert_eq!(
        fs::read(workdir.path().join("mods/lithium.jar")).unwrap(),
        NEW_JAR
    );
}

#[test]
fn test_describe_outcomes() {
    let outcome = ResolutionOutcome::Unresolved {
        reason: "Could not determine project ID".to_string(),
    };
    assert_eq!(describe(&outcome), "Could not determine project ID");
}
