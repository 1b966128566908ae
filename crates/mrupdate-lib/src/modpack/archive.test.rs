use super::*;
use std::io::Write;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
}

#[test]
fn test_extract_nested_entries() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("pack.mrpack");
    write_zip(
        &archive,
        &[
            ("modrinth.index.json", b"{}"),
            ("overrides/config/sodium.json", b"{\"a\":1}"),
        ],
    );

    let dest = temp.path().join("out");
    let count = extract_mrpack(&archive, &dest).unwrap();

    assert_eq!(count, 2);
    assert!(dest.join("modrinth.index.json").is_file());
    assert_eq!(
        fs::read(dest.join("overrides/config/sodium.json")).unwrap(),
        b"{\"a\":1}"
    );
}

#[test]
fn test_extract_skips_path_traversal() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("evil.mrpack");
    write_zip(
        &archive,
        &[("../escape.txt", b"nope"), ("index.json", b"{}")],
    );

    let dest = temp.path().join("out");
    let count = extract_mrpack(&archive, &dest).unwrap();

    assert_eq!(count, 1);
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_extract_rejects_non_zip() {
    let temp = TempDir::new().unwrap();
    let archive = temp.path().join("broken.mrpack");
    fs::write(&archive, b"definitely not a zip").unwrap();

    let result = extract_mrpack(&archive, &temp.path().join("out"));
    assert!(matches!(result, Err(ArchiveError::InvalidArchive { .. })));
}

#[test]
fn test_extract_missing_archive() {
    let temp = TempDir::new().unwrap();
    let result = extract_mrpack(&temp.path().join("absent.mrpack"), temp.path());
    assert!(matches!(result, Err(ArchiveError::OpenFailed { .. })));
}
