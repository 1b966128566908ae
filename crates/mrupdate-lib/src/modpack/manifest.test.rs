use super::*;
use std::fs;
use std::io::Write;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const MANIFEST: &str = r#"{
    "formatVersion": 1,
    "game": "minecraft",
    "versionId": "2.1.0",
    "name": "Lunar [Lite] Pack",
    "dependencies": {"minecraft": "1.20.1", "quilt-loader": "0.26.0"},
    "files": [
        {
            "path": "mods/sodium-0.5.3.jar",
            "downloads": ["https://cdn.modrinth.com/data/AANobbMI/versions/abc/sodium-0.5.3.jar"],
            "hashes": {"sha1": "0123", "sha512": "4567"},
            "env": {"client": "required", "server": "unsupported"},
            "fileSize": 1024
        }
    ]
}"#;

#[test]
fn test_manifest_fields_parse() {
    let manifest: ModpackManifest = serde_json::from_str(MANIFEST).unwrap();

    assert_eq!(manifest.version_id.as_deref(), Some("2.1.0"));
    assert_eq!(manifest.minecraft_version(), Some("1.20.1"));
    assert_eq!(manifest.loader_identifiers(), vec!["quilt-loader"]);

    let entry = &manifest.files[0];
    assert_eq!(entry.file_name(), Some("sodium-0.5.3.jar"));
    assert_eq!(entry.sha1(), Some("0123"));
    assert_eq!(entry.file_size, Some(1024));
    assert_eq!(
        entry.env.unwrap().server,
        crate::primitives::SideRequirement::Unsupported
    );
}

#[test]
fn test_pack_name_sanitized() {
    let manifest: ModpackManifest = serde_json::from_str(MANIFEST).unwrap();
    assert_eq!(manifest.pack_name(), "Lunar_Lite_Pack");
}

#[test]
fn test_pack_name_default() {
    let manifest: ModpackManifest =
        serde_json::from_str(r#"{"dependencies": {"minecraft": "1.20.1"}}"#).unwrap();
    assert_eq!(manifest.pack_name(), "modpack");
}

#[test]
fn test_entry_without_path_has_no_file_name() {
    let entry: ModEntry = serde_json::from_str(r#"{"downloads": []}"#).unwrap();
    assert_eq!(entry.file_name(), None);
    assert_eq!(entry.sha1(), None);
    assert_eq!(entry.first_download(), None);
}

#[test]
fn test_load_from_directory_root() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("modrinth.index.json"), MANIFEST).unwrap();

    let modpack = Modpack::load(temp.path()).unwrap();

    assert_eq!(modpack.minecraft_version, "1.20.1");
    assert_eq!(modpack.loaders, vec![LoaderFamily::Quilt]);
    assert_eq!(modpack.entries().len(), 1);
    assert!(!modpack.is_extracted());
}

#[test]
fn test_load_finds_nested_index_json() {
    let temp = TempDir::new().unwrap();
    let nested = temp.path().join("export").join("pack");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("index.json"), MANIFEST).unwrap();

    let modpack = Modpack::load(temp.path()).unwrap();
    assert_eq!(modpack.index_path, nested.join("index.json"));
}

#[test]
fn test_root_modrinth_index_preferred() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("index.json"), "{}").unwrap();
    fs::write(temp.path().join("modrinth.index.json"), MANIFEST).unwrap();

    assert_eq!(
        find_index(temp.path()),
        Some(temp.path().join("modrinth.index.json"))
    );
}

#[test]
fn test_load_missing_index() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        Modpack::load(temp.path()),
        Err(ManifestError::IndexNotFound { .. })
    ));
}

#[test]
fn test_load_invalid_json() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("modrinth.index.json"), "{ not json").unwrap();

    assert!(matches!(
        Modpack::load(temp.path()),
        Err(ManifestError::ParseFailed { .. })
    ));
}

#[test]
fn test_load_requires_minecraft_version() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("modrinth.index.json"),
        r#"{"dependencies": {"fabric-loader": "0.15.0"}, "files": []}"#,
    )
    .unwrap();

    assert!(matches!(
        Modpack::load(temp.path()),
        Err(ManifestError::MissingMinecraftVersion { .. })
    ));
}

#[test]
fn test_load_nonexistent_path() {
    let temp = TempDir::new().unwrap();
    assert!(matches!(
        Modpack::load(&temp.path().join("nope")),
        Err(ManifestError::PathNotFound { .. })
    ));
}

#[test]
fn test_load_from_mrpack_archive() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("pack.mrpack");
    let mut writer = zip::ZipWriter::new(fs::File::create(&archive).unwrap());
    writer
        .start_file("modrinth.index.json", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(MANIFEST.as_bytes()).unwrap();
    writer.finish().unwrap();

    let modpack = Modpack::load(&archive).unwrap();

    assert!(modpack.is_extracted());
    assert!(modpack.index_path.is_file());
    assert_eq!(modpack.pack_name(), "Lunar_Lite_Pack");
}
