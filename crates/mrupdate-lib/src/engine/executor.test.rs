use super::*;
use crate::api::MockModrinthClient;
use tempfile::TempDir;

fn version_file(name: &str) -> VersionFile {
    VersionFile {
        hashes: FileHashes {
            sha1: "unchecked-by-mock".to_string(),
            sha512: None,
        },
        url: format!("https://cdn.test/{name}"),
        filename: name.to_string(),
        primary: true,
        size: 0,
    }
}

fn backup_files(mods: &ModsDir) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(mods.backups())
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[test]
fn test_backup_name_format() {
    assert_eq!(
        backup_name("sodium-0.5.3.jar", "20240101_120000", 0),
        "sodium-0.5.3_20240101_120000.jar"
    );
    assert_eq!(
        backup_name("sodium-0.5.3.jar", "20240101_120000", 2),
        "sodium-0.5.3_20240101_120000-2.jar"
    );
    assert_eq!(backup_name("README", "20240101_120000", 0), "README_20240101_120000");
}

#[test]
fn test_prepare_creates_mods_dir() {
    let temp = TempDir::new().unwrap();
    let mods = ModsDir::prepare(temp.path()).unwrap();

    assert!(mods.path().is_dir());
    assert_eq!(mods.live_path("a.jar"), temp.path().join("mods").join("a.jar"));
}

#[test]
fn test_move_file_within_filesystem() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("a.jar");
    let dst = temp.path().join("b.jar");
    fs::write(&src, b"abc").unwrap();

    move_file(&src, &dst).unwrap();

    assert!(!src.exists());
    assert_eq!(fs::read(&dst).unwrap(), b"abc");
}

#[test]
fn test_copy_then_remove_leaves_no_partial() {
    let temp = TempDir::new().unwrap();
    let src = temp.path().join("a.jar");
    let dst = temp.path().join("dest").join("b.jar");
    fs::create_dir_all(dst.parent().unwrap()).unwrap();
    fs::write(&src, b"payload").unwrap();

    copy_then_remove(&src, &dst).unwrap();

    assert!(!src.exists());
    assert_eq!(fs::read(&dst).unwrap(), b"payload");
    assert!(!dst.with_file_name(".b.jar.partial").exists());
}

#[tokio::test]
async fn test_install_update_backs_up_existing_file() {
    let temp = TempDir::new().unwrap();
    let mods = ModsDir::prepare(temp.path()).unwrap();
    fs::write(mods.live_path("sodium.jar"), b"old").unwrap();

    let client = MockModrinthClient::new()
        .with_download("https://cdn.test/sodium-new.jar", Ok(b"new".to_vec()))
        .await;
    let executor = Executor::new(&client, &mods);

    let live = executor
        .install_update("sodium.jar", &version_file("sodium-new.jar"))
        .await
        .unwrap();

    assert_eq!(fs::read(&live).unwrap(), b"new");
    let backups = backup_files(&mods);
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("sodium_"));
    assert!(backups[0].ends_with(".jar"));
    assert_eq!(fs::read(mods.backups().join(&backups[0])).unwrap(), b"old");
}

#[tokio::test]
async fn test_install_update_without_existing_file() {
    let temp = TempDir::new().unwrap();
    let mods = ModsDir::prepare(temp.path()).unwrap();
    let client = MockModrinthClient::new()
        .with_download("https://cdn.test/lithium.jar", Ok(b"jar".to_vec()))
        .await;

    Executor::new(&client, &mods)
        .install_update("lithium.jar", &version_file("lithium.jar"))
        .await
        .unwrap();

    assert_eq!(fs::read(mods.live_path("lithium.jar")).unwrap(), b"jar");
    assert!(backup_files(&mods).is_empty());
}

#[tokio::test]
async fn test_download_failure_leaves_live_file_untouched() {
    let temp = TempDir::new().unwrap();
    let mods = ModsDir::prepare(temp.path()).unwrap();
    fs::write(mods.live_path("sodium.jar"), b"old").unwrap();

    let client = MockModrinthClient::new()
        .with_download("https://cdn.test/sodium-new.jar", Err("reset".to_string()))
        .await;

    let result = Executor::new(&client, &mods)
        .install_update("sodium.jar", &version_file("sodium-new.jar"))
        .await;

    assert!(matches!(result, Err(ExecuteError::Download { .. })));
    assert_eq!(fs::read(mods.live_path("sodium.jar")).unwrap(), b"old");
    assert!(backup_files(&mods).is_empty());
}

#[tokio::test]
async fn test_repeated_backups_get_unique_names() {
    let temp = TempDir::new().unwrap();
    let mods = ModsDir::prepare(temp.path()).unwrap();
    let client = MockModrinthClient::new()
        .with_download("https://cdn.test/a.jar", Ok(b"1".to_vec()))
        .await;
    let executor = Executor::new(&client, &mods);

    for content in [b"x", b"y"] {
        fs::write(mods.live_path("a.jar"), content).unwrap();
        executor.backup(&mods.live_path("a.jar")).unwrap();
    }

    let backups = backup_files(&mods);
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().any(|name| name.ends_with("-1.jar")));
}

#[tokio::test]
async fn test_restore_missing_downloads_into_place() {
    let temp = TempDir::new().unwrap();
    let mods = ModsDir::prepare(temp.path()).unwrap();
    let client = MockModrinthClient::new()
        .with_download("https://cdn.test/declared.jar", Ok(b"declared".to_vec()))
        .await;

    Executor::new(&client, &mods)
        .restore_missing("declared.jar", "https://cdn.test/declared.jar", None)
        .await
        .unwrap();

    assert_eq!(fs::read(mods.live_path("declared.jar")).unwrap(), b"declared");
}

#[tokio::test]
async fn test_cleanup_staging_removes_directory() {
    let temp = TempDir::new().unwrap();
    let mods = ModsDir::prepare(temp.path()).unwrap();
    let client = MockModrinthClient::new()
        .with_download("https://cdn.test/a.jar", Ok(b"a".to_vec()))
        .await;

    Executor::new(&client, &mods)
        .restore_missing("a.jar", "https://cdn.test/a.jar", None)
        .await
        .unwrap();
    mods.cleanup_staging();

    assert!(!mods.path().join(STAGING_DIR).exists());
}
