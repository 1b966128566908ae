use super::*;
use crate::primitives::SideRequirement;

fn entry(name: &str) -> ModEntry {
    ModEntry {
        path: format!("mods/{name}"),
        downloads: Vec::new(),
        hashes: Default::default(),
        env: None,
        file_size: None,
    }
}

fn project(slug: &str, title: &str) -> ProjectRef {
    ProjectRef {
        id: format!("id-{slug}"),
        slug: slug.to_string(),
        title: title.to_string(),
        server_side: SideRequirement::Required,
    }
}

fn chosen(name: &str) -> ChosenFile {
    ChosenFile {
        filename: name.to_string(),
        url: format!("https://cdn.test/{name}"),
        hashes: FileHashes {
            sha1: "abc".to_string(),
            sha512: None,
        },
        size: 1,
    }
}

fn sample_report() -> UpdateReport {
    let mut builder = ReportBuilder::new("1.20.1", vec!["fabric-loader".to_string()], 5);
    builder.push(
        entry("sodium.jar"),
        ResolutionOutcome::Updated {
            project: project("sodium", "Sodium"),
            old_version: "0.5.3".to_string(),
            new_version: "0.5.8".to_string(),
            chosen_file: chosen("sodium-0.5.8.jar"),
        },
    );
    builder.push(
        entry("lithium.jar"),
        ResolutionOutcome::UpToDate {
            project: project("lithium", "Lithium"),
            version: "0.11.2".to_string(),
            resolved_file: None,
            installed_file: None,
        },
    );
    builder.push(
        entry("gone.jar"),
        ResolutionOutcome::Missing {
            project_ref: ProjectRef::unknown("gone"),
            reason: MissingReason::ProjectNotFound,
        },
    );
    builder.push(
        entry("mystery.jar"),
        ResolutionOutcome::Unresolved {
            reason: "Could not determine project ID".to_string(),
        },
    );
    builder.push(
        entry("iris.jar"),
        ResolutionOutcome::Error {
            project: Some(project("iris", "Iris")),
            cause: "download failed".to_string(),
        },
    );
    builder.finish(false)
}

#[test]
fn test_summary_counts_every_kind() {
    let report = sample_report();

    assert_eq!(
        report.summary,
        ReportSummary {
            updated: 1,
            up_to_date: 1,
            missing: 1,
            unresolved: 1,
            errors: 1,
        }
    );
    assert_eq!(report.summary.total(), report.outcomes.len());
}

#[test]
fn test_markdown_sections() {
    let markdown = sample_report().to_markdown();

    assert!(markdown.starts_with("# Modpack Update Changelog\n"));
    assert!(markdown.contains("**Update Time:** "));
    assert!(markdown.contains("## Updated Mods\n- **Sodium** (sodium) 0.5.3 -> 0.5.8\n"));
    assert!(markdown.contains("## Already Up-to-date\n- **Lithium** (lithium) 0.11.2\n"));
    assert!(markdown.contains("- **gone** (not found on Modrinth)"));
    assert!(markdown.contains("- mystery.jar: Could not determine project ID"));
    assert!(markdown.contains("- Iris: download failed"));
    assert!(markdown.contains(
        "## Summary\n- Updated: 1\n- Up-to-date: 1\n- Missing: 1\n- Unresolved: 1\n- Errors: 1\n"
    ));
}

#[test]
fn test_markdown_omits_empty_sections() {
    let report = ReportBuilder::new("1.20.1", Vec::new(), 0).finish(false);
    let markdown = report.to_markdown();

    assert!(!markdown.contains("## Updated Mods"));
    assert!(!markdown.contains("## Errors"));
    assert!(markdown.contains("- Updated: 0"));
}

#[test]
fn test_cancelled_report_notes_progress() {
    let mut builder = ReportBuilder::new("1.20.1", Vec::new(), 3);
    builder.push(
        entry("a.jar"),
        ResolutionOutcome::Unresolved {
            reason: "x".to_string(),
        },
    );
    let report = builder.finish(true);

    assert!(report.cancelled);
    assert!(report.to_markdown().contains("processed 1 of 3 mods"));
}

#[test]
fn test_dry_run_flag_rendered() {
    let report = ReportBuilder::new("1.20.1", Vec::new(), 0)
        .dry_run(true)
        .finish(false);
    assert!(report.to_markdown().contains("**Dry run:**"));
}

#[test]
fn test_json_uses_tagged_outcomes() {
    let json: serde_json::Value =
        serde_json::from_str(&sample_report().to_json().unwrap()).unwrap();

    assert_eq!(json["outcomes"][0]["outcome"]["kind"], "updated");
    assert_eq!(json["outcomes"][0]["outcome"]["new_version"], "0.5.8");
    assert_eq!(json["outcomes"][2]["outcome"]["reason"], "project_not_found");
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["cancelled"], false);
}

#[test]
fn test_label_falls_back_to_file_name() {
    let report = sample_report();
    assert_eq!(report.outcomes[0].label(), "Sodium");
    assert_eq!(report.outcomes[3].label(), "mystery.jar");
}
