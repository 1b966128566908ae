//! Updating a modpack supplied as a `.mrpack` archive

use anyhow::Result;
use mrupdate_lib::Modpack;
use mrupdate_lib::engine::{CancellationFlag, NoProgress, OutcomeKind};
use mrupdate_tests::{PackFixture, RegistryFixture, VersionFixture, mod_entry};
use std::fs;

#[tokio::test]
async fn archive_is_extracted_updated_and_cleaned_up() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    let url = registry.cdn_url("lithium-1.2.0.jar");
    let (_, sha1) = registry.file(&url, b"lithium").await;
    registry.project("P1", "lithium", "Lithium", "optional").await;
    registry
        .versions(
            "P1",
            &[VersionFixture::new("P1", "1.2.0").file(&url, "lithium-1.2.0.jar", &sha1)],
        )
        .await;

    let manifest = PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry(
            "mods/lithium.jar",
            Some(&registry.manifest_url("P1", "old", "lithium.jar")),
            None,
        )],
    );
    let archive = pack.write_mrpack(&manifest, "")?;

    let modpack = Modpack::load(&archive)?;
    assert!(modpack.is_extracted());
    let extracted_dir = modpack
        .index_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap();

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;
    assert_eq!(report.outcomes[0].outcome.kind(), OutcomeKind::Updated);
    assert!(pack.live("lithium.jar").is_file());

    drop(modpack);
    assert!(!extracted_dir.exists());
    Ok(())
}

#[tokio::test]
async fn nested_index_inside_archive_is_found() -> Result<()> {
    let pack = PackFixture::new()?;
    let manifest = PackFixture::manifest("1.20.1", &[("quilt-loader", "0.26.0")], vec![]);
    let archive = pack.write_mrpack(&manifest, "My Pack")?;

    let modpack = Modpack::load(&archive)?;
    assert_eq!(modpack.minecraft_version, "1.20.1");
    assert!(modpack.loaders.iter().any(|loader| loader.is_quilt()));
    assert!(modpack.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn archive_without_manifest_is_rejected() -> Result<()> {
    let pack = PackFixture::new()?;
    let archive = pack.pack_dir().join("empty.mrpack");
    let mut writer = zip::ZipWriter::new(fs::File::create(&archive)?);
    writer.start_file("overrides/readme.txt", zip::write::SimpleFileOptions::default())?;
    writer.finish()?;

    assert!(Modpack::load(&archive).is_err());
    Ok(())
}
