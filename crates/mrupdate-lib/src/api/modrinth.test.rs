// Tests for Modrinth API client

use super::*;
use crate::modpack::hashing::sha1_hex;
use mockito::{Matcher, Server};
use tempfile::TempDir;

fn live_client(server: &Server) -> LiveModrinthClient {
    LiveModrinthClient::new(
        Client::new(),
        RegistryConfig {
            base_url: server.url(),
        },
    )
}

const VERSION_JSON: &str = r#"{
    "id": "ver-2",
    "project_id": "AANobbMI",
    "name": "Sodium 0.5.8",
    "version_number": "0.5.8",
    "game_versions": ["1.20.1"],
    "loaders": ["fabric", "quilt"],
    "date_published": "2024-03-01T12:00:00Z",
    "files": [
        {
            "hashes": {"sha1": "abc", "sha512": "def"},
            "url": "https://cdn.modrinth.com/sodium-extra.jar",
            "filename": "sodium-extra.jar",
            "primary": false,
            "size": 10
        },
        {
            "hashes": {"sha1": "123"},
            "url": "https://cdn.modrinth.com/sodium.jar",
            "filename": "sodium.jar",
            "primary": true,
            "size": 20
        }
    ]
}"#;

// ============================================================================
// Data Type Tests
// ============================================================================

#[test]
fn test_version_primary_file_prefers_flagged_file() {
    let version: Version = serde_json::from_str(VERSION_JSON).unwrap();
    assert_eq!(version.primary_file().unwrap().filename, "sodium.jar");
}

#[test]
fn test_version_primary_file_falls_back_to_first() {
    let mut version: Version = serde_json::from_str(VERSION_JSON).unwrap();
    for file in &mut version.files {
        file.primary = false;
    }
    assert_eq!(version.primary_file().unwrap().filename, "sodium-extra.jar");
}

#[test]
fn test_version_loader_queries() {
    let mut version: Version = serde_json::from_str(VERSION_JSON).unwrap();
    assert!(version.declares_loader("QUILT"));
    assert!(!version.is_fabric_only());

    version.loaders = vec!["fabric".to_string()];
    assert!(version.is_fabric_only());
}

#[test]
fn test_project_side_defaults_to_unknown() {
    let project: Project =
        serde_json::from_str(r#"{"id": "P1", "slug": "lithium", "title": "Lithium"}"#).unwrap();
    assert_eq!(project.client_side, SideRequirement::Unknown);
    assert_eq!(project.server_side, SideRequirement::Unknown);
}

// ============================================================================
// Live Client Tests
// ============================================================================

#[tokio::test]
async fn test_live_get_project_success() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/project/AANobbMI")
        .with_status(200)
        .with_body(
            r#"{"id": "AANobbMI", "slug": "sodium", "title": "Sodium",
                "client_side": "required", "server_side": "unsupported"}"#,
        )
        .create_async()
        .await;

    let project = live_client(&server)
        .get_project("AANobbMI")
        .await
        .unwrap()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(project.slug, "sodium");
    assert_eq!(project.server_side, SideRequirement::Unsupported);
}

#[tokio::test]
async fn test_live_get_project_non_200_is_none() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/project/gone")
        .with_status(404)
        .create_async()
        .await;

    let project = live_client(&server).get_project("gone").await.unwrap();
    assert!(project.is_none());
}

#[tokio::test]
async fn test_live_get_project_bad_json_is_error() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/project/broken")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let result = live_client(&server).get_project("broken").await;
    assert!(matches!(result, Err(ModrinthError::JsonError { .. })));
}

#[tokio::test]
async fn test_live_list_versions_sends_filters() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/project/AANobbMI/version")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("game_versions".into(), r#"["1.20.1"]"#.into()),
            Matcher::UrlEncoded("loaders".into(), r#"["quilt","fabric"]"#.into()),
        ]))
        .with_status(200)
        .with_body(format!("[{}]", VERSION_JSON))
        .create_async()
        .await;

    let versions = live_client(&server)
        .list_versions(
            "AANobbMI",
            "1.20.1",
            &["quilt".to_string(), "fabric".to_string()],
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].version_number, "0.5.8");
}

#[tokio::test]
async fn test_live_list_versions_non_200_is_empty() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/project/AANobbMI/version")
        .match_query(Matcher::Any)
        .with_status(500)
        .create_async()
        .await;

    let versions = live_client(&server)
        .list_versions("AANobbMI", "1.20.1", &["fabric".to_string()])
        .await
        .unwrap();
    assert!(versions.is_empty());
}

#[tokio::test]
async fn test_live_get_version_by_hash() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/version_file/deadbeef")
        .match_query(Matcher::UrlEncoded("algorithm".into(), "sha1".into()))
        .with_status(200)
        .with_body(VERSION_JSON)
        .create_async()
        .await;

    let version = live_client(&server)
        .get_version_by_hash("deadbeef")
        .await
        .unwrap()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(version.id, "ver-2");
}

#[tokio::test]
async fn test_live_get_version_by_hash_miss() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/version_file/unknown")
        .match_query(Matcher::Any)
        .with_status(404)
        .create_async()
        .await;

    let version = live_client(&server)
        .get_version_by_hash("unknown")
        .await
        .unwrap();
    assert!(version.is_none());
}

#[tokio::test]
async fn test_live_transport_failure_is_error() {
    // Nothing listens on port 9 in the test environment
    let client = LiveModrinthClient::new(
        Client::new(),
        RegistryConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        },
    );

    let result = client.get_project("anything").await;
    assert!(matches!(result, Err(ModrinthError::RequestFailed { .. })));
}

#[tokio::test]
async fn test_live_download_verifies_hash() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/files/mod.jar")
        .with_status(200)
        .with_body("jar bytes")
        .create_async()
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("mod.jar");
    let url = format!("{}/files/mod.jar", server.url());
    let hashes = FileHashes {
        sha1: sha1_hex(b"jar bytes"),
        sha512: None,
    };

    let written = live_client(&server)
        .download_file(&url, &dest, Some(&hashes))
        .await
        .unwrap();

    assert_eq!(written, 9);
    assert_eq!(std::fs::read(&dest).unwrap(), b"jar bytes");
}

#[tokio::test]
async fn test_live_download_hash_mismatch_removes_file() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/files/mod.jar")
        .with_status(200)
        .with_body("tampered")
        .create_async()
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("mod.jar");
    let url = format!("{}/files/mod.jar", server.url());
    let hashes = FileHashes {
        sha1: sha1_hex(b"jar bytes"),
        sha512: None,
    };

    let result = live_client(&server)
        .download_file(&url, &dest, Some(&hashes))
        .await;

    assert!(matches!(result, Err(ModrinthError::HashMismatch { .. })));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_live_download_status_failure() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/files/missing.jar")
        .with_status(404)
        .create_async()
        .await;

    let temp = TempDir::new().unwrap();
    let url = format!("{}/files/missing.jar", server.url());

    let result = live_client(&server)
        .download_file(&url, &temp.path().join("missing.jar"), None)
        .await;

    assert!(matches!(
        result,
        Err(ModrinthError::DownloadFailed { status: 404, .. })
    ));
}

#[test]
fn test_base_url_trailing_slash_trimmed() {
    let client = LiveModrinthClient::new(
        Client::new(),
        RegistryConfig {
            base_url: "https://api.example.test/v2/".to_string(),
        },
    );
    assert_eq!(client.base_url(), "https://api.example.test/v2");
}

// ============================================================================
// Mock Client Tests
// ============================================================================

#[tokio::test]
async fn test_mock_project_lookup_by_slug_and_id() {
    let mock = MockModrinthClient::new()
        .with_project(Project {
            id: "AANobbMI".to_string(),
            slug: "sodium".to_string(),
            title: "Sodium".to_string(),
            client_side: SideRequirement::Required,
            server_side: SideRequirement::Unsupported,
        })
        .await;

    assert!(mock.get_project("sodium").await.unwrap().is_some());
    assert!(mock.get_project("AANobbMI").await.unwrap().is_some());
    assert!(mock.get_project("other").await.unwrap().is_none());
}

#[tokio::test]
async fn test_mock_download_records_calls() {
    let mock = MockModrinthClient::new()
        .with_download("https://cdn.test/a.jar", Ok(b"abc".to_vec()))
        .await
        .with_download("https://cdn.test/b.jar", Err("connection reset".to_string()))
        .await;

    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("a.jar");

    assert_eq!(
        mock.download_file("https://cdn.test/a.jar", &dest, None)
            .await
            .unwrap(),
        3
    );
    assert!(
        mock.download_file("https://cdn.test/b.jar", &dest, None)
            .await
            .is_err()
    );
    assert_eq!(
        mock.downloaded_urls().await,
        vec!["https://cdn.test/a.jar", "https://cdn.test/b.jar"]
    );
}
