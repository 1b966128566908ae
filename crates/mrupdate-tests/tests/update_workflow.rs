//! End-to-end update runs against a mocked registry

use anyhow::Result;
use mrupdate_lib::engine::{
    CancellationFlag, ChannelProgress, MissingReason, NoProgress, OutcomeKind, ProgressEvent,
    ProgressSink, ResolutionOutcome,
};
use mrupdate_tests::{PackFixture, RegistryFixture, VersionFixture, mod_entry};
use std::fs;

const OLD_JAR: &[u8] = b"lithium 1.0.0";
const NEW_JAR: &[u8] = b"lithium 1.2.0";

fn kinds(outcomes: &[mrupdate_lib::engine::ModOutcome]) -> Vec<OutcomeKind> {
    outcomes.iter().map(|o| o.outcome.kind()).collect()
}

#[tokio::test]
async fn new_mod_is_installed_from_unknown() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    let url = registry.cdn_url("lithium-1.2.0.jar");
    let (download, sha1) = registry.file(&url, NEW_JAR).await;
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry
        .versions(
            "P1",
            &[VersionFixture::new("P1", "1.2.0").file(&url, "lithium-1.2.0.jar", &sha1)],
        )
        .await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry(
            "mods/lithium.jar",
            Some(&registry.manifest_url("P1", "old", "lithium.jar")),
            None,
        )],
    ))?;

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    download.assert_async().await;
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
        other => panic!("expected update, got {:?}", other),
    }
    assert_eq!(fs::read(pack.live("lithium.jar"))?, NEW_JAR);
    assert!(!pack.mods_dir().join(".mrupdate-staging").exists());
    Ok(())
}

#[tokio::test]
async fn second_run_settles_to_up_to_date() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    let url = registry.cdn_url("lithium-1.2.0.jar");
    let (download, sha1) = registry.file(&url, NEW_JAR).await;
    let download = download.expect(1);
    let latest = VersionFixture::new("P1", "1.2.0").file(&url, "lithium-1.2.0.jar", &sha1);
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry.versions("P1", &[latest.clone()]).await;
    registry.hash(&sha1, &latest).await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry(
            "mods/lithium.jar",
            Some(&registry.manifest_url("P1", "old", "lithium.jar")),
            None,
        )],
    ))?;
    let engine = registry.engine(1);

    let first = engine
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;
    let second = engine
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    assert_eq!(first.summary.updated, 1);
    assert_eq!(second.summary.updated, 0);
    assert_eq!(second.summary.up_to_date, 1);
    download.assert_async().await;
    Ok(())
}

#[tokio::test]
async fn every_entry_gets_exactly_one_outcome() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    // Broken download first, so a later mod proves the failure stayed local
    let broken_url = registry.cdn_url("iris-2.0.jar");
    registry.failing_file(&broken_url, 500).await;
    registry.project("IRIS", "iris", "Iris", "unsupported").await;
    registry
        .versions(
            "IRIS",
            &[VersionFixture::new("IRIS", "2.0").file(&broken_url, "iris-2.0.jar", "00")],
        )
        .await;

    registry.missing_project("GONE").await;

    registry.project("FORGEONLY", "forge-mod", "Forge Mod", "required").await;
    registry
        .versions(
            "FORGEONLY",
            &[VersionFixture::new("FORGEONLY", "5.0").loaders(&["forge"])],
        )
        .await;

    let url = registry.cdn_url("lithium-1.2.0.jar");
    let (_, sha1) = registry.file(&url, NEW_JAR).await;
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry
        .versions(
            "P1",
            &[VersionFixture::new("P1", "1.2.0").file(&url, "lithium-1.2.0.jar", &sha1)],
        )
        .await;

    let files = vec![
        mod_entry(
            "mods/iris.jar",
            Some(&registry.manifest_url("IRIS", "a", "iris.jar")),
            None,
        ),
        mod_entry(
            "mods/gone.jar",
            Some(&registry.manifest_url("GONE", "a", "gone.jar")),
            None,
        ),
        mod_entry(
            "mods/forge-mod.jar",
            Some(&registry.manifest_url("FORGEONLY", "a", "forge-mod.jar")),
            None,
        ),
        mod_entry("mods/mystery.jar", Some("https://example.invalid/mystery.jar"), None),
        mod_entry("mods/empty.jar", None, None),
        mod_entry(
            "mods/lithium.jar",
            Some(&registry.manifest_url("P1", "old", "lithium.jar")),
            None,
        ),
    ];
    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        files,
    ))?;

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    assert_eq!(report.outcomes.len(), modpack.entries().len());
    assert_eq!(
        kinds(&report.outcomes),
        vec![
            OutcomeKind::Error,
            OutcomeKind::Missing,
            OutcomeKind::Missing,
            OutcomeKind::Unresolved,
            OutcomeKind::Unresolved,
            OutcomeKind::Updated,
        ]
    );

    match &report.outcomes[1].outcome {
        ResolutionOutcome::Missing { reason, .. } => {
            assert_eq!(*reason, MissingReason::ProjectNotFound)
        }
        other => panic!("expected missing, got {:?}", other),
    }
    match &report.outcomes[2].outcome {
        ResolutionOutcome::Missing { reason, .. } => {
            assert_eq!(*reason, MissingReason::NoCompatibleVersions)
        }
        other => panic!("expected missing, got {:?}", other),
    }

    assert!(!pack.live("iris.jar").exists());
    assert_eq!(fs::read(pack.live("lithium.jar"))?, NEW_JAR);
    assert_eq!(report.summary.total(), 6);

    let markdown = report.to_markdown();
    assert!(markdown.contains("## Errors"));
    assert!(markdown.contains("not found on Modrinth"));
    assert!(markdown.contains("no compatible versions found"));
    Ok(())
}

#[tokio::test]
async fn existing_file_is_backed_up_before_replacement() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    pack.install("lithium.jar", OLD_JAR)?;

    let old_sha1 = mrupdate_lib::modpack::hashing::sha1_hex(OLD_JAR);
    let url = registry.cdn_url("lithium-1.2.0.jar");
    let (_, new_sha1) = registry.file(&url, NEW_JAR).await;
    let installed = VersionFixture::new("P1", "1.0.0")
        .published("2024-06-01T00:00:00Z")
        .file(&registry.cdn_url("lithium-1.0.0.jar"), "lithium-1.0.0.jar", &old_sha1);
    let latest = VersionFixture::new("P1", "1.2.0").file(&url, "lithium-1.2.0.jar", &new_sha1);
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry.versions("P1", &[latest, installed.clone()]).await;
    registry.hash(&old_sha1, &installed).await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry(
            "mods/lithium.jar",
            Some(&registry.cdn_url("lithium-1.0.0.jar")),
            Some(&old_sha1),
        )],
    ))?;

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    match &report.outcomes[0].outcome {
        ResolutionOutcome::Updated {
            old_version,
            new_version,
            ..
        } => {
            assert_eq!(old_version, "1.0.0");
            assert_eq!(new_version, "1.2.0");
        }
        other => panic!("expected update, got {:?}", other),
    }
    assert_eq!(fs::read(pack.live("lithium.jar"))?, NEW_JAR);

    let backups = pack.backups();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("lithium_"));
    assert!(backups[0].ends_with(".jar"));
    assert_eq!(fs::read(pack.mods_dir().join("old_mods").join(&backups[0]))?, OLD_JAR);
    Ok(())
}

#[tokio::test]
async fn failed_download_leaves_installed_file_alone() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    pack.install("lithium.jar", OLD_JAR)?;

    let old_sha1 = mrupdate_lib::modpack::hashing::sha1_hex(OLD_JAR);
    let url = registry.cdn_url("lithium-1.2.0.jar");
    registry.failing_file(&url, 503).await;
    let installed = VersionFixture::new("P1", "1.0.0").published("2024-06-01T00:00:00Z");
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry
        .versions(
            "P1",
            &[
                VersionFixture::new("P1", "1.2.0").file(&url, "lithium-1.2.0.jar", "ff"),
                installed.clone(),
            ],
        )
        .await;
    registry.hash(&old_sha1, &installed).await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry("mods/lithium.jar", None, Some(&old_sha1))],
    ))?;

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    assert_eq!(kinds(&report.outcomes), vec![OutcomeKind::Error]);
    assert_eq!(fs::read(pack.live("lithium.jar"))?, OLD_JAR);
    assert!(pack.backups().is_empty());
    Ok(())
}

#[tokio::test]
async fn up_to_date_mod_without_local_file_is_restored() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    let manifest_url = registry.manifest_url("P1", "v120", "lithium.jar");
    let (restore, sha1) = registry.file(&manifest_url, NEW_JAR).await;
    let latest = VersionFixture::new("P1", "1.2.0").file(
        &registry.cdn_url("lithium-1.2.0.jar"),
        "lithium-1.2.0.jar",
        &sha1,
    );
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry.versions("P1", &[latest.clone()]).await;
    registry.hash(&sha1, &latest).await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry("mods/lithium.jar", Some(&manifest_url), Some(&sha1))],
    ))?;

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    restore.assert_async().await;
    assert_eq!(kinds(&report.outcomes), vec![OutcomeKind::UpToDate]);
    assert_eq!(fs::read(pack.live("lithium.jar"))?, NEW_JAR);
    Ok(())
}

#[tokio::test]
async fn quilt_pack_swaps_fabric_build_for_matching_quilt_build() -> Result<()> {
    const FABRIC_JAR: &[u8] = b"qsl 3.0 fabric";
    const QUILT_JAR: &[u8] = b"qsl 3.0 quilt";

    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    pack.install("qsl.jar", FABRIC_JAR)?;

    let fabric_sha1 = mrupdate_lib::modpack::hashing::sha1_hex(FABRIC_JAR);
    let quilt_url = registry.cdn_url("qsl-3.0-quilt.jar");
    let (_, quilt_sha1) = registry.file(&quilt_url, QUILT_JAR).await;

    let fabric_build = VersionFixture::new("QSL", "3.0")
        .id("qsl-fabric")
        .loaders(&["fabric"])
        .file(&registry.cdn_url("qsl-3.0-fabric.jar"), "qsl-3.0-fabric.jar", &fabric_sha1);
    let quilt_build = VersionFixture::new("QSL", "3.0")
        .id("qsl-quilt")
        .loaders(&["quilt"])
        .file(&quilt_url, "qsl-3.0-quilt.jar", &quilt_sha1);

    registry.project("QSL", "qsl", "Quilt Standard Libraries", "required").await;
    registry
        .versions("QSL", &[fabric_build.clone(), quilt_build.clone()])
        .await;
    registry.hash(&fabric_sha1, &fabric_build).await;
    registry.hash(&quilt_sha1, &quilt_build).await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("quilt-loader", "0.27.1")],
        vec![mod_entry("mods/qsl.jar", None, Some(&fabric_sha1))],
    ))?;
    let engine = registry.engine(1);

    let report = engine
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    match &report.outcomes[0].outcome {
        ResolutionOutcome::Updated {
            old_version,
            new_version,
            chosen_file,
            ..
        } => {
            assert_eq!(old_version, "3.0");
            assert_eq!(new_version, "3.0");
            assert_eq!(chosen_file.filename, "qsl-3.0-quilt.jar");
        }
        other => panic!("expected quilt swap, got {:?}", other),
    }
    assert_eq!(fs::read(pack.live("qsl.jar"))?, QUILT_JAR);

    // The Quilt build is now installed, so nothing changes on a rerun
    let rerun = engine
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;
    assert_eq!(kinds(&rerun.outcomes), vec![OutcomeKind::UpToDate]);
    Ok(())
}

#[tokio::test]
async fn concurrent_lookups_keep_manifest_order() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    let mut files = Vec::new();

    for index in 0..6 {
        let id = format!("M{}", index);
        let name = format!("mod{}.jar", index);
        let contents = format!("mod {} contents", index);
        let url = registry.cdn_url(&name);
        let (_, sha1) = registry.file(&url, contents.as_bytes()).await;
        registry
            .project(&id, &format!("mod-{}", index), &format!("Mod {}", index), "optional")
            .await;
        registry
            .versions(&id, &[VersionFixture::new(&id, "1.0").file(&url, &name, &sha1)])
            .await;
        files.push(mod_entry(
            &format!("mods/{}", name),
            Some(&registry.manifest_url(&id, "x", &name)),
            None,
        ));
    }

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        files,
    ))?;

    let report = registry
        .engine(4)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;

    let labels: Vec<&str> = report.outcomes.iter().map(|o| o.label()).collect();
    assert_eq!(labels, vec!["Mod 0", "Mod 1", "Mod 2", "Mod 3", "Mod 4", "Mod 5"]);
    assert_eq!(report.summary.updated, 6);
    for index in 0..6 {
        assert!(pack.live(&format!("mod{}.jar", index)).is_file());
    }
    Ok(())
}

#[tokio::test]
async fn dry_run_reports_without_touching_files() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    let url = registry.cdn_url("lithium-1.2.0.jar");
    let (download, sha1) = registry.file(&url, NEW_JAR).await;
    let download = download.expect(0);
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry
        .versions(
            "P1",
            &[VersionFixture::new("P1", "1.2.0").file(&url, "lithium-1.2.0.jar", &sha1)],
        )
        .await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry(
            "mods/lithium.jar",
            Some(&registry.manifest_url("P1", "old", "lithium.jar")),
            None,
        )],
    ))?;

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(true), &NoProgress, &CancellationFlag::new())
        .await?;

    assert!(report.dry_run);
    assert_eq!(report.summary.updated, 1);
    assert!(!pack.mods_dir().exists());
    download.assert_async().await;
    Ok(())
}

/// Requests cancellation as soon as the first mod finishes
struct CancelAfterFirst(CancellationFlag);

impl ProgressSink for CancelAfterFirst {
    fn emit(&self, event: ProgressEvent) {
        if matches!(event, ProgressEvent::ModFinished { index: 0, .. }) {
            self.0.cancel();
        }
    }
}

#[tokio::test]
async fn cancellation_between_mods_yields_partial_report() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    let mut files = Vec::new();

    for index in 0..3 {
        let id = format!("C{}", index);
        let name = format!("c{}.jar", index);
        let url = registry.cdn_url(&name);
        let (_, sha1) = registry.file(&url, name.as_bytes()).await;
        registry.project(&id, &id, &id, "optional").await;
        registry
            .versions(&id, &[VersionFixture::new(&id, "1.0").file(&url, &name, &sha1)])
            .await;
        files.push(mod_entry(
            &format!("mods/{}", name),
            Some(&registry.manifest_url(&id, "x", &name)),
            None,
        ));
    }

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        files,
    ))?;
    let cancel = CancellationFlag::new();

    let report = registry
        .engine(1)
        .run(
            &modpack,
            &pack.run_options(false),
            &CancelAfterFirst(cancel.clone()),
            &cancel,
        )
        .await?;

    assert!(report.cancelled);
    assert_eq!(report.outcomes.len(), 1);
    assert!(pack.live("c0.jar").is_file());
    assert!(!pack.live("c1.jar").exists());
    assert!(report.to_markdown().contains("processed 1 of 3"));
    Ok(())
}

#[tokio::test]
async fn progress_stream_reports_each_mod() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    registry.missing_project("GONE").await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry(
            "mods/gone.jar",
            Some(&registry.manifest_url("GONE", "a", "gone.jar")),
            None,
        )],
    ))?;
    let (progress, mut events) = ChannelProgress::channel();

    registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &progress, &CancellationFlag::new())
        .await?;
    drop(progress);

    let mut received = Vec::new();
    while let Some(event) = events.recv().await {
        received.push(event);
    }

    assert!(matches!(received.first(), Some(ProgressEvent::RunStarted { total: 1 })));
    assert!(received.iter().any(|event| matches!(
        event,
        ProgressEvent::ModFinished {
            kind: OutcomeKind::Missing,
            ..
        }
    )));
    assert!(matches!(received.last(), Some(ProgressEvent::RunFinished { .. })));
    Ok(())
}
