use super::*;
use crate::api::FileHashes;
use crate::engine::{ChosenFile, MissingReason, ProjectRef, ReportBuilder};
use std::io::Read;
use tempfile::TempDir;

fn project(slug: &str, server_side: SideRequirement) -> ProjectRef {
    ProjectRef {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        title: slug.to_string(),
        server_side,
    }
}

fn entry(name: &str, url: Option<&str>, sha1: Option<&str>) -> ModEntry {
    ModEntry {
        path: format!("mods/{name}"),
        downloads: url.map(|u| vec![u.to_string()]).unwrap_or_default(),
        hashes: ManifestHashes {
            sha1: sha1.map(str::to_string),
            sha512: None,
        },
        env: None,
        file_size: None,
    }
}

fn manifest() -> ModpackManifest {
    serde_json::from_str(
        r#"{
            "name": "Lunar Pack",
            "versionId": "1.4.0",
            "dependencies": {"minecraft": "1.20.1", "quilt-loader": "0.26.0"},
            "files": []
        }"#,
    )
    .unwrap()
}

fn report() -> UpdateReport {
    let mut builder = ReportBuilder::new("1.20.1", vec!["quilt-loader".to_string()], 5);
    builder.push(
        entry("sodium.jar", Some("https://cdn.test/old-sodium.jar"), Some("old")),
        ResolutionOutcome::Updated {
            project: project("sodium", SideRequirement::Unsupported),
            old_version: "0.5.3".to_string(),
            new_version: "0.5.8".to_string(),
            chosen_file: ChosenFile {
                filename: "sodium-0.5.8.jar".to_string(),
                url: "https://cdn.test/sodium-0.5.8.jar".to_string(),
                hashes: FileHashes {
                    sha1: "new-sha1".to_string(),
                    sha512: Some("new-sha512".to_string()),
                },
                size: 42,
            },
        },
    );
    builder.push(
        entry("lithium.jar", Some("https://cdn.test/lithium.jar"), Some("lith-sha1")),
        ResolutionOutcome::UpToDate {
            project: project("lithium", SideRequirement::Optional),
            version: "0.11.2".to_string(),
            resolved_file: None,
            installed_file: None,
        },
    );
    builder.push(
        entry("ferrite.jar", None, None),
        ResolutionOutcome::UpToDate {
            project: project("ferrite", SideRequirement::Required),
            version: "6.0.0".to_string(),
            resolved_file: Some(ChosenFile {
                filename: "ferrite-6.0.0.jar".to_string(),
                url: "https://cdn.test/ferrite.jar".to_string(),
                hashes: FileHashes {
                    sha1: "ferrite-sha1".to_string(),
                    sha512: None,
                },
                size: 7,
            }),
            installed_file: None,
        },
    );
    builder.push(
        entry("nohash.jar", Some("https://cdn.test/nohash.jar"), None),
        ResolutionOutcome::UpToDate {
            project: project("nohash", SideRequirement::Required),
            version: "1.0".to_string(),
            resolved_file: None,
            installed_file: None,
        },
    );
    builder.push(
        entry("gone.jar", Some("https://cdn.test/gone.jar"), Some("x")),
        ResolutionOutcome::Missing {
            project_ref: ProjectRef::unknown("gone"),
            reason: MissingReason::ProjectNotFound,
        },
    );
    builder.finish(false)
}

fn options(temp: &TempDir, mode: GenerationMode) -> PackageOptions {
    PackageOptions {
        mode,
        pack_name: "Lunar_Pack".to_string(),
        output_dir: temp.path().join("dist"),
        overrides_dir: temp.path().join("overrides"),
        extras_dir: temp.path().to_path_buf(),
        mods_dir: temp.path().join("mods"),
    }
}

#[test]
fn test_output_file_names() {
    assert_eq!(output_file_name("Pack", GenerationMode::Client), "Pack.mrpack");
    assert_eq!(output_file_name("Pack", GenerationMode::Server), "Pack-server.mrpack");
}

#[test]
fn test_client_index_contents() {
    let temp = TempDir::new().unwrap();
    let (index, summary) =
        build_index(&manifest(), &report(), &options(&temp, GenerationMode::Client));

    assert_eq!(index.format_version, 1);
    assert_eq!(index.game, "minecraft");
    assert_eq!(index.version_id, "1.4.0");
    assert_eq!(index.name, "Lunar Pack");
    assert_eq!(index.dependencies.get("quilt-loader").map(String::as_str), Some("0.26.0"));

    let paths: Vec<_> = index.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["mods/sodium.jar", "mods/lithium.jar", "mods/ferrite.jar"]);
    assert_eq!(summary.included, 3);
    assert_eq!(summary.skipped_no_hash, 1);

    let sodium = &index.files[0];
    assert_eq!(sodium.downloads, vec!["https://cdn.test/sodium-0.5.8.jar"]);
    assert_eq!(sodium.hashes.sha1.as_deref(), Some("new-sha1"));
    assert_eq!(sodium.env, SideEnv::for_mode(GenerationMode::Client));

    let ferrite = &index.files[2];
    assert_eq!(ferrite.downloads, vec!["https://cdn.test/ferrite.jar"]);
    assert_eq!(ferrite.hashes.sha1.as_deref(), Some("ferrite-sha1"));
}

#[test]
fn test_server_index_skips_unsupported() {
    let temp = TempDir::new().unwrap();
    let (index, summary) =
        build_index(&manifest(), &report(), &options(&temp, GenerationMode::Server));

    assert_eq!(index.name, "Lunar Pack (Server)");
    assert_eq!(summary.skipped_server_unsupported, 1);
    assert!(index.files.iter().all(|f| f.path != "mods/sodium.jar"));
    assert!(index.files.iter().all(|f| f.env.server == SideRequirement::Required));
    assert!(index.files.iter().all(|f| f.env.client == SideRequirement::Unsupported));
}

#[test]
fn test_up_to_date_packages_installed_registry_file() {
    let temp = TempDir::new().unwrap();
    let installed = ChosenFile {
        filename: "lithium-1.2.0.jar".to_string(),
        url: "https://cdn.test/lithium-1.2.0.jar".to_string(),
        hashes: FileHashes {
            sha1: "lith-new-sha1".to_string(),
            sha512: Some("lith-new-sha512".to_string()),
        },
        size: 11,
    };
    let mut builder = ReportBuilder::new("1.20.1", vec!["quilt-loader".to_string()], 1);
    builder.push(
        entry("lithium.jar", Some("https://cdn.test/lithium-1.0.0.jar"), Some("lith-old-sha1")),
        ResolutionOutcome::UpToDate {
            project: project("lithium", SideRequirement::Optional),
            version: "1.2.0".to_string(),
            resolved_file: Some(installed.clone()),
            installed_file: Some(installed),
        },
    );
    let report = builder.finish(false);

    let (index, summary) =
        build_index(&manifest(), &report, &options(&temp, GenerationMode::Client));

    assert_eq!(summary.included, 1);
    let lithium = &index.files[0];
    assert_eq!(lithium.path, "mods/lithium.jar");
    assert_eq!(lithium.downloads, vec!["https://cdn.test/lithium-1.2.0.jar"]);
    assert_eq!(lithium.hashes.sha1.as_deref(), Some("lith-new-sha1"));
    assert_eq!(lithium.hashes.sha512.as_deref(), Some("lith-new-sha512"));
    assert_eq!(lithium.file_size, Some(11));
}

#[test]
fn test_live_file_hash_fallback() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("mods")).unwrap();
    fs::write(temp.path().join("mods/nohash.jar"), b"hello").unwrap();

    let (index, summary) =
        build_index(&manifest(), &report(), &options(&temp, GenerationMode::Client));

    assert_eq!(summary.skipped_no_hash, 0);
    let nohash = index.files.iter().find(|f| f.path == "mods/nohash.jar").unwrap();
    assert_eq!(
        nohash.hashes.sha1.as_deref(),
        Some("aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d")
    );
}

#[test]
fn test_default_version_id() {
    let temp = TempDir::new().unwrap();
    let mut manifest = manifest();
    manifest.version_id = None;

    let (index, _) = build_index(&manifest, &report(), &options(&temp, GenerationMode::Client));
    assert!(index.version_id.starts_with('v'));
    assert_eq!(index.version_id.len(), "v2024.01.01".len());
}

#[test]
fn test_write_mrpack_archive_layout() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("overrides/config")).unwrap();
    fs::write(temp.path().join("overrides/config/sodium.json"), b"{}").unwrap();
    fs::write(temp.path().join("icon.png"), b"png").unwrap();

    let summary =
        write_mrpack(&manifest(), &report(), &options(&temp, GenerationMode::Client)).unwrap();

    assert_eq!(summary.path, temp.path().join("dist/Lunar_Pack.mrpack"));
    assert!(summary.overrides_copied);
    assert_eq!(summary.extras, vec!["icon.png"]);

    let mut archive = zip::ZipArchive::new(File::open(&summary.path).unwrap()).unwrap();
    let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["icon.png", "modrinth.index.json", "overrides/config/sodium.json"]
    );

    let mut index_json = String::new();
    archive
        .by_name("modrinth.index.json")
        .unwrap()
        .read_to_string(&mut index_json)
        .unwrap();
    let index: serde_json::Value = serde_json::from_str(&index_json).unwrap();
    assert_eq!(index["formatVersion"], 1);
    assert_eq!(index["files"][0]["env"]["client"], "required");
    assert!(!temp.path().join("dist/Lunar_Pack.mrpack.partial").exists());
}
