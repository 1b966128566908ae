use super::*;
use chrono::{TimeZone, Utc};

fn version(number: &str, day: u32, loaders: &[&str]) -> Version {
    Version {
        id: format!("id-{number}-{}", loaders.join("+")),
        project_id: "proj".to_string(),
        name: number.to_string(),
        version_number: number.to_string(),
        changelog: None,
        game_versions: vec!["1.20.1".to_string()],
        loaders: loaders.iter().map(|s| s.to_string()).collect(),
        date_published: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        files: Vec::new(),
    }
}

#[test]
fn test_sort_newest_first_is_stable() {
    let mut versions = vec![
        version("1.0", 1, &["fabric"]),
        version("2.0-a", 5, &["fabric"]),
        version("2.0-b", 5, &["fabric"]),
        version("1.5", 3, &["fabric"]),
    ];
    sort_newest_first(&mut versions);

    let order: Vec<_> = versions.iter().map(|v| v.version_number.as_str()).collect();
    assert_eq!(order, vec!["2.0-a", "2.0-b", "1.5", "1.0"]);
}

#[test]
fn test_select_without_installed_version() {
    let candidates = vec![version("2.0", 2, &["fabric"]), version("1.0", 1, &["fabric"])];
    let selection = select_from(&candidates, None).unwrap();

    assert_eq!(selection.version.version_number, "2.0");
    assert!(selection.is_newer);
    assert_eq!(selection.reason, SelectionReason::NotInstalled);
}

#[test]
fn test_select_already_latest() {
    let candidates = vec![version("2.0", 2, &["fabric"]), version("1.0", 1, &["fabric"])];
    let selection = select_from(&candidates, Some("2.0")).unwrap();

    assert!(!selection.is_newer);
    assert_eq!(selection.reason, SelectionReason::AlreadyLatest);
}

#[test]
fn test_select_newer_available() {
    let candidates = vec![version("2.0", 2, &["fabric"]), version("1.0", 1, &["fabric"])];
    let selection = select_from(&candidates, Some("1.0")).unwrap();

    assert_eq!(selection.version.version_number, "2.0");
    assert!(selection.is_newer);
    assert_eq!(selection.reason, SelectionReason::NewerAvailable);
}

#[test]
fn test_select_unlisted_installed_version_is_outdated() {
    let candidates = vec![version("2.0", 2, &["fabric"])];
    let selection = select_from(&candidates, Some("0.9-custom")).unwrap();

    assert!(selection.is_newer);
    assert_eq!(selection.reason, SelectionReason::InstalledNotListed);
}

#[test]
fn test_select_empty_candidates() {
    assert!(select_from(&[], Some("1.0")).is_none());
    assert!(choose(&[], true, None).is_none());
}

#[test]
fn test_quilt_exact_match_preferred_over_newer() {
    let installed = version("3.0", 1, &["fabric"]);
    let usable = vec![
        version("3.1", 4, &["fabric"]),
        version("3.0", 2, &["fabric"]),
        version("3.0", 2, &["quilt"]),
    ];

    let selection = choose(&usable, true, Some(&installed)).unwrap();

    assert_eq!(selection.version.version_number, "3.0");
    assert!(selection.version.declares_loader("quilt"));
    assert!(selection.is_newer);
    assert_eq!(selection.reason, SelectionReason::QuiltExactMatch);
}

#[test]
fn test_quilt_exact_match_skipped_when_installed_declares_quilt() {
    let installed = version("3.0", 1, &["fabric", "quilt"]);
    let usable = vec![version("3.0", 2, &["quilt"])];

    let selection = choose(&usable, true, Some(&installed)).unwrap();
    assert_eq!(selection.reason, SelectionReason::AlreadyLatest);
    assert!(!selection.is_newer);
}

#[test]
fn test_quilt_restriction_when_quilt_is_newest() {
    let usable = vec![
        version("2.0", 5, &["quilt"]),
        version("2.1", 5, &["fabric"]),
        version("1.0", 1, &["fabric"]),
    ];
    assert_eq!(consideration(&usable), Consideration::QuiltOnly);

    let selection = choose(&usable, true, None).unwrap();
    assert_eq!(selection.version.version_number, "2.0");
}

#[test]
fn test_quilt_restriction_applies_on_equal_publish_time() {
    // Registry listed the fabric build first, but equal timestamps still count
    let usable = vec![version("2.1", 5, &["fabric"]), version("2.0", 5, &["quilt"])];
    assert_eq!(consideration(&usable), Consideration::QuiltOnly);

    let installed = version("2.0", 5, &["quilt"]);
    let selection = choose(&usable, true, Some(&installed)).unwrap();
    assert!(!selection.is_newer);
}

#[test]
fn test_no_quilt_restriction_when_fabric_is_newer() {
    let usable = vec![version("2.1", 6, &["fabric"]), version("2.0", 5, &["quilt"])];
    assert_eq!(consideration(&usable), Consideration::All);

    let selection = choose(&usable, true, None).unwrap();
    assert_eq!(selection.version.version_number, "2.1");
}

#[test]
fn test_fabric_pack_ignores_quilt_preference() {
    let installed = version("3.0", 1, &["fabric"]);
    let usable = vec![version("3.0", 2, &["fabric"]), version("3.0", 2, &["quilt"])];

    let selection = choose(&usable, false, Some(&installed)).unwrap();
    assert_eq!(selection.reason, SelectionReason::AlreadyLatest);
    assert!(selection.version.is_fabric_only());
}
