use super::*;
use chrono::{TimeZone, Utc};

fn version(game_versions: &[&str], loaders: &[&str]) -> Version {
    Version {
        id: "v".to_string(),
        project_id: "p".to_string(),
        name: String::new(),
        version_number: "1.0.0".to_string(),
        changelog: None,
        game_versions: game_versions.iter().map(|s| s.to_string()).collect(),
        loaders: loaders.iter().map(|s| s.to_string()).collect(),
        date_published: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        files: Vec::new(),
    }
}

#[test]
fn test_quilt_loader_includes_fabric() {
    let set = CompatibleLoaders::from_identifiers(&["quilt-loader"]);
    assert_eq!(set.tags(), vec!["fabric", "quilt"]);
}

#[test]
fn test_forge_is_strict() {
    let set = CompatibleLoaders::from_identifiers(&["forge"]);
    assert_eq!(set.tags(), vec!["forge"]);
    assert!(!set.contains("neoforge"));
}

#[test]
fn test_fabric_does_not_include_quilt() {
    let set = CompatibleLoaders::from_identifiers(&["fabric-loader"]);
    assert_eq!(set.tags(), vec!["fabric"]);
}

#[test]
fn test_neoforge_is_strict() {
    let set = CompatibleLoaders::from_identifiers(&["neoforge"]);
    assert_eq!(set.tags(), vec!["neoforge"]);
    assert!(!set.contains("forge"));
}

#[test]
fn test_unknown_loader_kept_lowercase() {
    let set = CompatibleLoaders::from_identifiers(&["LiteLoader"]);
    assert_eq!(set.tags(), vec!["liteloader"]);
}

#[test]
fn test_accepts_is_case_insensitive() {
    let set = CompatibleLoaders::from_identifiers(&["fabric"]);
    assert!(set.accepts(&["Fabric"]));
    assert!(!set.accepts(&["forge", "neoforge"]));
    assert!(!set.accepts::<&str>(&[]));
}

#[test]
fn test_minecraft_same_minor_compatible() {
    assert!(minecraft_version_compatible("1.21.7", "1.21.5"));
}

#[test]
fn test_minecraft_different_minor_incompatible() {
    assert!(!minecraft_version_compatible("1.20.1", "1.21.1"));
}

#[test]
fn test_minecraft_two_part_matches_three_part() {
    // Both parse to at least major.minor, so the minor rule applies
    assert!(minecraft_version_compatible("1.21", "1.21.0"));
}

#[test]
fn test_minecraft_unparsable_requires_exact() {
    assert!(minecraft_version_compatible("23w13a", "23w13a"));
    assert!(!minecraft_version_compatible("1.21", "1.21-pre1"));
    assert!(!minecraft_version_compatible("1", "1.0"));
}

#[test]
fn test_usable_needs_both_predicates() {
    let loaders = CompatibleLoaders::from_identifiers(&["quilt-loader"]);

    assert!(is_usable(&version(&["1.20", "1.20.1"], &["fabric"]), "1.20.4", &loaders));
    assert!(!is_usable(&version(&["1.19.4"], &["quilt"]), "1.20.4", &loaders));
    assert!(!is_usable(&version(&["1.20.4"], &["forge"]), "1.20.4", &loaders));
}
