use super::*;
use crate::api::{FileHashes, MockModrinthClient, VersionFile};
use chrono::{TimeZone, Utc};

fn project(id: &str, slug: &str) -> Project {
    Project {
        id: id.to_string(),
        slug: slug.to_string(),
        title: slug.to_uppercase(),
        client_side: SideRequirement::Required,
        server_side: SideRequirement::Optional,
    }
}

fn version(project_id: &str, number: &str, day: u32, loaders: &[&str]) -> Version {
    Version {
        id: format!("{project_id}-{number}"),
        project_id: project_id.to_string(),
        name: number.to_string(),
        version_number: number.to_string(),
        changelog: None,
        game_versions: vec!["1.20.1".to_string()],
        loaders: loaders.iter().map(|s| s.to_string()).collect(),
        date_published: Utc.with_ymd_and_hms(2024, 2, day, 0, 0, 0).unwrap(),
        files: vec![VersionFile {
            hashes: FileHashes {
                sha1: format!("sha-{project_id}-{number}"),
                sha512: None,
            },
            url: format!("https://cdn.test/{project_id}/{number}.jar"),
            filename: format!("{project_id}-{number}.jar"),
            primary: true,
            size: 3,
        }],
    }
}

fn fabric_context() -> ResolveContext {
    ResolveContext::new("1.20.1", &[LoaderFamily::Fabric])
}

#[test]
fn test_project_id_from_cdn_url() {
    assert_eq!(
        project_id_from_url("https://cdn.modrinth.com/data/AANobbMI/versions/abc123/sodium.jar"),
        Some("AANobbMI".to_string())
    );
}

#[test]
fn test_project_id_requires_data_versions_structure() {
    assert_eq!(project_id_from_url("https://example.com/files/sodium.jar"), None);
    assert_eq!(project_id_from_url("https://cdn.modrinth.com/data/AANobbMI"), None);
    assert_eq!(project_id_from_url("https://cdn.modrinth.com/data//versions/x.jar"), None);
    assert_eq!(project_id_from_url("not a url"), None);
}

#[test]
fn test_project_id_ignores_query() {
    assert_eq!(
        project_id_from_url("http://127.0.0.1:1234/data/P1/versions/v1/a.jar?x=data/Q/versions"),
        Some("P1".to_string())
    );
}

#[test]
fn test_context_detects_quilt() {
    let context = ResolveContext::new("1.20.1", &[LoaderFamily::Quilt]);
    assert!(context.has_quilt);
    assert!(context.loaders.contains("fabric"));
    assert!(!fabric_context().has_quilt);
}

#[tokio::test]
async fn test_unresolved_without_url_or_hash() {
    let client = MockModrinthClient::new();
    let context = fabric_context();

    let resolution = Resolver::new(&client, &context)
        .resolve(&ModQuery::default())
        .await
        .unwrap();

    assert!(matches!(resolution, Resolution::Unresolved { .. }));
}

#[tokio::test]
async fn test_unresolved_when_hash_unknown_and_no_url() {
    let client = MockModrinthClient::new();
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: None,
        sha1: Some("nobody-knows".to_string()),
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();
    assert!(matches!(resolution, Resolution::Unresolved { .. }));
}

#[tokio::test]
async fn test_missing_project() {
    let client = MockModrinthClient::new();
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: Some("gone".to_string()),
        sha1: None,
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();

    match resolution {
        Resolution::Missing { project, reason } => {
            assert_eq!(project.id, "gone");
            assert_eq!(reason, MissingReason::ProjectNotFound);
        }
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_when_nothing_compatible() {
    let mut forge_only = version("P1", "1.0", 1, &["forge"]);
    forge_only.game_versions = vec!["1.20.1".to_string()];
    let client = MockModrinthClient::new()
        .with_project(project("P1", "lithium"))
        .await
        .with_versions("P1", vec![forge_only])
        .await;
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: Some("P1".to_string()),
        sha1: None,
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();

    match resolution {
        Resolution::Missing { project, reason } => {
            assert_eq!(project.slug, "lithium");
            assert_eq!(reason, MissingReason::NoCompatibleVersions);
        }
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[tokio::test]
async fn test_hash_lookup_overrides_url_and_sets_current() {
    let installed = version("P1", "1.0", 1, &["fabric"]);
    let client = MockModrinthClient::new()
        .with_project(project("P1", "lithium"))
        .await
        .with_hash("installed-sha", installed.clone())
        .await
        .with_versions(
            "P1",
            vec![installed.clone(), version("P1", "1.1", 3, &["fabric"])],
        )
        .await;
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: Some("wrong-id".to_string()),
        sha1: Some("installed-sha".to_string()),
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();

    match resolution {
        Resolution::Update {
            project,
            current,
            target,
            reason,
        } => {
            assert_eq!(project.id, "P1");
            assert_eq!(current.unwrap().version_number, "1.0");
            assert_eq!(target.version_number, "1.1");
            assert_eq!(reason, SelectionReason::NewerAvailable);
        }
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[tokio::test]
async fn test_up_to_date_when_installed_is_newest() {
    let installed = version("P1", "1.1", 3, &["fabric"]);
    let client = MockModrinthClient::new()
        .with_project(project("P1", "lithium"))
        .await
        .with_hash("installed-sha", installed.clone())
        .await
        .with_versions("P1", vec![version("P1", "1.0", 1, &["fabric"]), installed])
        .await;
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: None,
        sha1: Some("installed-sha".to_string()),
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();

    match resolution {
        Resolution::UpToDate { current, .. } => assert_eq!(current.version_number, "1.1"),
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[tokio::test]
async fn test_quilt_pack_prefers_quilt_build_of_same_version() {
    let installed = version("P1", "3.0", 1, &["fabric"]);
    let mut quilt_build = version("P1", "3.0", 1, &["quilt"]);
    quilt_build.id = "P1-3.0-quilt".to_string();
    let client = MockModrinthClient::new()
        .with_project(project("P1", "sodium"))
        .await
        .with_hash("installed-sha", installed.clone())
        .await
        .with_versions("P1", vec![installed, quilt_build])
        .await;
    let context = ResolveContext::new("1.20.1", &[LoaderFamily::Quilt]);
    let query = ModQuery {
        url_project_id: None,
        sha1: Some("installed-sha".to_string()),
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();

    match resolution {
        Resolution::Update { target, reason, .. } => {
            assert_eq!(target.id, "P1-3.0-quilt");
            assert_eq!(reason, SelectionReason::QuiltExactMatch);
        }
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[tokio::test]
async fn test_registry_failure_is_error() {
    let client = MockModrinthClient::new()
        .with_project_error("P1", "connection refused")
        .await;
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: Some("P1".to_string()),
        sha1: None,
    };

    let result = Resolver::new(&client, &context).resolve(&query).await;
    assert!(matches!(
        result,
        Err(ResolveError::Registry {
            stage: "fetching project",
            ..
        })
    ));
}

#[tokio::test]
async fn test_failed_hash_lookup_falls_back_to_url_project() {
    let client = MockModrinthClient::new()
        .with_hash_error("installed-sha", "connection reset")
        .await;
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: Some("P1".to_string()),
        sha1: Some("installed-sha".to_string()),
    };

    let state = Resolver::new(&client, &context)
        .step(ResolveState::Identify, &query)
        .await
        .unwrap();

    assert!(matches!(
        state,
        ResolveState::FetchProject { ref project_id, current: None } if project_id == "P1"
    ));
}

#[tokio::test]
async fn test_failed_hash_lookup_still_resolves_by_url() {
    let client = MockModrinthClient::new()
        .with_hash_error("installed-sha", "connection reset")
        .await
        .with_project(project("P1", "lithium"))
        .await
        .with_versions("P1", vec![version("P1", "1.0", 1, &["fabric"])])
        .await;
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: Some("P1".to_string()),
        sha1: Some("installed-sha".to_string()),
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();

    match resolution {
        Resolution::Update {
            current, reason, ..
        } => {
            assert!(current.is_none());
            assert_eq!(reason, SelectionReason::NotInstalled);
        }
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_hash_lookup_without_url_is_unresolved() {
    let client = MockModrinthClient::new()
        .with_hash_error("installed-sha", "connection reset")
        .await;
    let context = fabric_context();
    let query = ModQuery {
        url_project_id: None,
        sha1: Some("installed-sha".to_string()),
    };

    let resolution = Resolver::new(&client, &context).resolve(&query).await.unwrap();
    assert!(matches!(resolution, Resolution::Unresolved { .. }));
}

#[tokio::test]
async fn test_step_by_step_transitions() {
    let client = MockModrinthClient::new()
        .with_project(project("P1", "lithium"))
        .await
        .with_versions("P1", vec![version("P1", "1.0", 1, &["fabric"])])
        .await;
    let context = fabric_context();
    let resolver = Resolver::new(&client, &context);
    let query = ModQuery {
        url_project_id: Some("P1".to_string()),
        sha1: None,
    };

    let state = resolver.step(ResolveState::Identify, &query).await.unwrap();
    assert!(matches!(state, ResolveState::FetchProject { current: None, .. }));

    let state = resolver.step(state, &query).await.unwrap();
    assert!(matches!(state, ResolveState::FetchVersions { .. }));

    let state = resolver.step(state, &query).await.unwrap();
    assert!(matches!(state, ResolveState::Filter { ref candidates, .. } if candidates.len() == 1));

    let state = resolver.step(state, &query).await.unwrap();
    assert!(matches!(state, ResolveState::Select { .. }));

    let state = resolver.step(state, &query).await.unwrap();
    assert!(matches!(
        state,
        ResolveState::Done(Resolution::Update {
            reason: SelectionReason::NotInstalled,
            ..
        })
    ));
}
