//! Update followed by client/server `.mrpack` generation

use anyhow::Result;
use mrupdate_lib::GenerationMode;
use mrupdate_lib::engine::{CancellationFlag, NoProgress};
use mrupdate_lib::modpack::{PackageOptions, write_mrpack};
use mrupdate_tests::{PackFixture, RegistryFixture, VersionFixture, mod_entry};
use serde_json::Value;
use std::fs;
use std::io::Read;
use std::path::Path;
use tempfile::TempDir;

const SODIUM_JAR: &[u8] = b"sodium 0.6.0";
const LITHIUM_JAR: &[u8] = b"lithium 1.2.0";

fn read_index(archive: &Path) -> Result<Value> {
    let mut zip = zip::ZipArchive::new(fs::File::open(archive)?)?;
    let mut contents = String::new();
    zip.by_name("modrinth.index.json")?
        .read_to_string(&mut contents)?;
    Ok(serde_json::from_str(&contents)?)
}

fn archive_names(archive: &Path) -> Result<Vec<String>> {
    let zip = zip::ZipArchive::new(fs::File::open(archive)?)?;
    let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
    names.sort();
    Ok(names)
}

#[tokio::test]
async fn client_and_server_archives_follow_side_support() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    let sodium_url = registry.cdn_url("sodium-0.6.0.jar");
    let (_, sodium_sha1) = registry.file(&sodium_url, SODIUM_JAR).await;
    registry.project("SOD", "sodium", "Sodium", "unsupported").await;
    registry
        .versions(
            "SOD",
            &[VersionFixture::new("SOD", "0.6.0").file(
                &sodium_url,
                "sodium-0.6.0.jar",
                &sodium_sha1,
            )],
        )
        .await;

    let lithium_url = registry.cdn_url("lithium-1.2.0.jar");
    let (_, lithium_sha1) = registry.file(&lithium_url, LITHIUM_JAR).await;
    registry.project("LIT", "lithium", "Lithium", "optional").await;
    registry
        .versions(
            "LIT",
            &[VersionFixture::new("LIT", "1.2.0").file(
                &lithium_url,
                "lithium-1.2.0.jar",
                &lithium_sha1,
            )],
        )
        .await;

    registry.missing_project("GONE").await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![
            mod_entry(
                "mods/sodium.jar",
                Some(&registry.manifest_url("SOD", "a", "sodium.jar")),
                None,
            ),
            mod_entry(
                "mods/lithium.jar",
                Some(&registry.manifest_url("LIT", "a", "lithium.jar")),
                None,
            ),
            mod_entry(
                "mods/gone.jar",
                Some(&registry.manifest_url("GONE", "a", "gone.jar")),
                None,
            ),
        ],
    ))?;

    let report = registry
        .engine(2)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;
    assert_eq!(report.summary.updated, 2);
    assert_eq!(report.summary.missing, 1);

    let output = TempDir::new()?;
    let overrides = TempDir::new()?;
    fs::create_dir_all(overrides.path().join("config/sodium"))?;
    fs::write(overrides.path().join("config/sodium/options.json"), "{}")?;
    let extras = TempDir::new()?;
    fs::write(extras.path().join("README.md"), "# E2E Pack")?;

    let options = |mode| PackageOptions {
        mode,
        pack_name: modpack.pack_name(),
        output_dir: output.path().to_path_buf(),
        overrides_dir: overrides.path().to_path_buf(),
        extras_dir: extras.path().to_path_buf(),
        mods_dir: pack.mods_dir(),
    };

    let client = write_mrpack(&modpack.manifest, &report, &options(GenerationMode::Client))?;
    let server = write_mrpack(&modpack.manifest, &report, &options(GenerationMode::Server))?;

    assert_eq!(client.path, output.path().join("E2E_Pack.mrpack"));
    assert_eq!(server.path, output.path().join("E2E_Pack-server.mrpack"));
    assert_eq!(client.included, 2);
    assert_eq!(server.included, 1);
    assert_eq!(server.skipped_server_unsupported, 1);

    let client_index = read_index(&client.path)?;
    assert_eq!(client_index["formatVersion"], 1);
    assert_eq!(client_index["game"], "minecraft");
    assert_eq!(client_index["versionId"], "1.0.0");
    assert_eq!(client_index["name"], "E2E Pack");
    assert_eq!(client_index["dependencies"]["fabric-loader"], "0.16.9");
    let client_files = client_index["files"].as_array().unwrap();
    assert_eq!(client_files.len(), 2);
    assert_eq!(client_files[0]["path"], "mods/sodium.jar");
    assert_eq!(client_files[0]["hashes"]["sha1"], sodium_sha1);
    assert_eq!(client_files[0]["downloads"][0], sodium_url);
    assert_eq!(client_files[0]["env"]["client"], "required");
    assert_eq!(client_files[0]["env"]["server"], "unsupported");

    let server_index = read_index(&server.path)?;
    assert_eq!(server_index["name"], "E2E Pack (Server)");
    let server_files = server_index["files"].as_array().unwrap();
    assert_eq!(server_files.len(), 1);
    assert_eq!(server_files[0]["path"], "mods/lithium.jar");
    assert_eq!(server_files[0]["env"]["client"], "unsupported");
    assert_eq!(server_files[0]["env"]["server"], "required");

    assert_eq!(
        archive_names(&client.path)?,
        vec![
            "README.md".to_string(),
            "modrinth.index.json".to_string(),
            "overrides/config/sodium/options.json".to_string(),
        ]
    );
    assert!(!output.path().join("E2E_Pack.mrpack.partial").exists());
    Ok(())
}

fn client_options(pack_name: String, output: &Path, pack: &PackFixture) -> PackageOptions {
    PackageOptions {
        mode: GenerationMode::Client,
        pack_name,
        output_dir: output.to_path_buf(),
        overrides_dir: output.join("no-overrides"),
        extras_dir: output.join("no-extras"),
        mods_dir: pack.mods_dir(),
    }
}

#[tokio::test]
async fn up_to_date_mod_is_packaged_from_installed_version() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    pack.install("lithium.jar", LITHIUM_JAR)?;

    let manifest_url = registry.manifest_url("LIT", "v110", "lithium.jar");
    let cdn_url = registry.cdn_url("lithium-1.2.0.jar");
    let (_, sha1) = registry.file(&cdn_url, LITHIUM_JAR).await;
    let latest = VersionFixture::new("LIT", "1.2.0").file(&cdn_url, "lithium-1.2.0.jar", &sha1);
    registry.project("LIT", "lithium", "Lithium", "optional").await;
    registry.versions("LIT", &[latest.clone()]).await;
    registry.hash(&sha1, &latest).await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry("mods/lithium.jar", Some(&manifest_url), Some("0ld5ha1"))],
    ))?;

    let report = registry
        .engine(1)
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;
    assert_eq!(report.summary.up_to_date, 1);

    let output = TempDir::new()?;
    let summary = write_mrpack(
        &modpack.manifest,
        &report,
        &client_options(modpack.pack_name(), output.path(), &pack),
    )?;

    assert!(!summary.overrides_copied);
    let index = read_index(&summary.path)?;
    assert_eq!(index["files"][0]["path"], "mods/lithium.jar");
    assert_eq!(index["files"][0]["downloads"][0], cdn_url);
    assert_eq!(index["files"][0]["hashes"]["sha1"], sha1);
    Ok(())
}

#[tokio::test]
async fn restored_mod_is_packaged_from_manifest_source() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;

    let manifest_url = registry.manifest_url("LIT", "v120", "lithium.jar");
    let (download, sha1) = registry.file(&manifest_url, LITHIUM_JAR).await;
    let latest = VersionFixture::new("LIT", "1.2.0").file(
        &registry.cdn_url("lithium-1.2.0.jar"),
        "lithium-1.2.0.jar",
        &sha1,
    );
    registry.project("LIT", "lithium", "Lithium", "optional").await;
    registry.versions("LIT", &[latest.clone()]).await;
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
    assert_eq!(report.summary.up_to_date, 1);
    download.assert_async().await;

    let output = TempDir::new()?;
    let summary = write_mrpack(
        &modpack.manifest,
        &report,
        &client_options(modpack.pack_name(), output.path(), &pack),
    )?;

    let index = read_index(&summary.path)?;
    assert_eq!(index["files"][0]["downloads"][0], manifest_url);
    assert_eq!(index["files"][0]["hashes"]["sha1"], sha1);
    Ok(())
}

#[tokio::test]
async fn repeated_runs_package_the_version_in_mods() -> Result<()> {
    const OLD_JAR: &[u8] = b"lithium 1.0.0";
    let mut registry = RegistryFixture::start().await;
    let pack = PackFixture::new()?;
    pack.install("lithium.jar", OLD_JAR)?;

    let old_url = registry.manifest_url("LIT", "v100", "lithium.jar");
    let new_url = registry.cdn_url("lithium-1.2.0.jar");
    let (_, old_sha1) = registry.file(&old_url, OLD_JAR).await;
    let (_, new_sha1) = registry.file(&new_url, LITHIUM_JAR).await;
    let old = VersionFixture::new("LIT", "1.0.0")
        .published("2024-06-01T00:00:00Z")
        .file(&old_url, "lithium.jar", &old_sha1);
    let latest = VersionFixture::new("LIT", "1.2.0").file(&new_url, "lithium-1.2.0.jar", &new_sha1);
    registry.project("LIT", "lithium", "Lithium", "optional").await;
    registry.versions("LIT", &[latest.clone(), old.clone()]).await;
    registry.hash(&old_sha1, &old).await;
    registry.hash(&new_sha1, &latest).await;

    let modpack = pack.write(&PackFixture::manifest(
        "1.21.4",
        &[("fabric-loader", "0.16.9")],
        vec![mod_entry("mods/lithium.jar", Some(&old_url), Some(&old_sha1))],
    ))?;
    let engine = registry.engine(1);

    let first = engine
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;
    let second = engine
        .run(&modpack, &pack.run_options(false), &NoProgress, &CancellationFlag::new())
        .await?;
    assert_eq!(first.summary.updated, 1);
    assert_eq!(second.summary.up_to_date, 1);
    assert_eq!(fs::read(pack.live("lithium.jar"))?, LITHIUM_JAR);

    let output = TempDir::new()?;
    let summary = write_mrpack(
        &modpack.manifest,
        &second,
        &client_options(modpack.pack_name(), output.path(), &pack),
    )?;

    let index = read_index(&summary.path)?;
    assert_eq!(index["files"][0]["downloads"][0], new_url);
    assert_eq!(index["files"][0]["hashes"]["sha1"], new_sha1);
    Ok(())
}
