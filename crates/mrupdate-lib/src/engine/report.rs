//! Per-mod outcomes and the aggregate run report

use super::resolver::{MissingReason, ProjectRef};
use crate::api::{FileHashes, VersionFile};
use crate::modpack::ModEntry;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write;

/// The distributable chosen for a mod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChosenFile {
    pub filename: String,
    pub url: String,
    pub hashes: FileHashes,
    pub size: u64,
}

impl From<&VersionFile> for ChosenFile {
    fn from(file: &VersionFile) -> Self {
        Self {
            filename: file.filename.clone(),
            url: file.url.clone(),
            hashes: file.hashes.clone(),
            size: file.size,
        }
    }
}

/// Terminal state of one mod in a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Updated {
        project: ProjectRef,
        old_version: String,
        new_version: String,
        chosen_file: ChosenFile,
    },
    UpToDate {
        project: ProjectRef,
        version: String,
        /// Primary file of the installed version, when the registry listed one
        #[serde(skip_serializing_if = "Option::is_none")]
        resolved_file: Option<ChosenFile>,
        /// Registry file whose SHA-1 matches what is in `mods/`
        #[serde(skip_serializing_if = "Option::is_none")]
        installed_file: Option<ChosenFile>,
    },
    Missing {
        project_ref: ProjectRef,
        reason: MissingReason,
    },
    Unresolved {
        reason: String,
    },
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        project: Option<ProjectRef>,
        cause: String,
    },
}

impl ResolutionOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Updated { .. } => OutcomeKind::Updated,
            Self::UpToDate { .. } => OutcomeKind::UpToDate,
            Self::Missing { .. } => OutcomeKind::Missing,
            Self::Unresolved { .. } => OutcomeKind::Unresolved,
            Self::Error { .. } => OutcomeKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Updated,
    UpToDate,
    Missing,
    Unresolved,
    Error,
}

/// One manifest entry and what happened to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModOutcome {
    pub entry: ModEntry,
    pub outcome: ResolutionOutcome,
}

impl ModOutcome {
    /// Project title when known, else the entry's file name
    pub fn label(&self) -> &str {
        match &self.outcome {
            ResolutionOutcome::Updated { project, .. }
            | ResolutionOutcome::UpToDate { project, .. }
            | ResolutionOutcome::Missing {
                project_ref: project,
                ..
            }
            | ResolutionOutcome::Error {
                project: Some(project),
                ..
            } => &project.title,
            _ => self.entry.display_name(),
        }
    }
}

/// Counts per outcome kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub updated: usize,
    pub up_to_date: usize,
    pub missing: usize,
    pub unresolved: usize,
    pub errors: usize,
}

impl ReportSummary {
    pub fn total(&self) -> usize {
        self.updated + self.up_to_date + self.missing + self.unresolved + self.errors
    }

    fn record(&mut self, kind: OutcomeKind) {
        match kind {
            OutcomeKind::Updated => self.updated += 1,
            OutcomeKind::UpToDate => self.up_to_date += 1,
            OutcomeKind::Missing => self.missing += 1,
            OutcomeKind::Unresolved => self.unresolved += 1,
            OutcomeKind::Error => self.errors += 1,
        }
    }
}

/// Aggregate result of a run; built once by `ReportBuilder`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub generated_at: DateTime<Local>,
    pub minecraft_version: String,
    pub loaders: Vec<String>,
    pub total_entries: usize,
    pub dry_run: bool,
    pub cancelled: bool,
    pub summary: ReportSummary,
    pub outcomes: Vec<ModOutcome>,
}

impl UpdateReport {
    pub fn of_kind(&self, kind: OutcomeKind) -> impl Iterator<Item = &ModOutcome> {
        self.outcomes
            .iter()
            .filter(move |o| o.outcome.kind() == kind)
    }

    /// Render the changelog document
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_markdown(&mut out);
        out
    }

    fn write_markdown(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "# Modpack Update Changelog\n")?;
        writeln!(
            out,
            "**Update Time:** {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        )?;

        if self.dry_run {
            writeln!(out, "**Dry run:** no files were changed\n")?;
        }
        if self.cancelled {
            writeln!(
                out,
                "**Cancelled:** processed {} of {} mods\n",
                self.outcomes.len(),
                self.total_entries
            )?;
        }

        let mut updated = self.of_kind(OutcomeKind::Updated).peekable();
        if updated.peek().is_some() {
            writeln!(out, "## Updated Mods")?;
            for item in updated {
                if let ResolutionOutcome::Updated {
                    project,
                    old_version,
                    new_version,
                    ..
                } = &item.outcome
                {
                    writeln!(
                        out,
                        "- **{}** ({}) {} -> {}",
                        project.title, project.slug, old_version, new_version
                    )?;
                }
            }
            writeln!(out)?;
        }

        let mut current = self.of_kind(OutcomeKind::UpToDate).peekable();
        if current.peek().is_some() {
            writeln!(out, "## Already Up-to-date")?;
            for item in current {
                if let ResolutionOutcome::UpToDate {
                    project, version, ..
                } = &item.outcome
                {
                    writeln!(out, "- **{}** ({}) {}", project.title, project.slug, version)?;
                }
            }
            writeln!(out)?;
        }

        let mut missing = self.of_kind(OutcomeKind::Missing).peekable();
        if missing.peek().is_some() {
            writeln!(out, "## Missing/Unavailable Mods")?;
            for item in missing {
                if let ResolutionOutcome::Missing {
                    project_ref,
                    reason,
                } = &item.outcome
                {
                    writeln!(out, "- **{}** ({})", project_ref.slug, reason)?;
                }
            }
            writeln!(out)?;
        }

        let mut failures = self
            .outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.outcome.kind(),
                    OutcomeKind::Unresolved | OutcomeKind::Error
                )
            })
            .peekable();
        if failures.peek().is_some() {
            writeln!(out, "## Errors")?;
            for item in failures {
                match &item.outcome {
                    ResolutionOutcome::Unresolved { reason } => {
                        writeln!(out, "- {}: {}", item.entry.display_name(), reason)?
                    }
                    ResolutionOutcome::Error { cause, .. } => {
                        writeln!(out, "- {}: {}", item.label(), cause)?
                    }
                    _ => {}
                }
            }
            writeln!(out)?;
        }

        writeln!(out, "## Summary")?;
        writeln!(out, "- Updated: {}", self.summary.updated)?;
        writeln!(out, "- Up-to-date: {}", self.summary.up_to_date)?;
        writeln!(out, "- Missing: {}", self.summary.missing)?;
        writeln!(out, "- Unresolved: {}", self.summary.unresolved)?;
        writeln!(out, "- Errors: {}", self.summary.errors)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Accumulates outcomes in manifest order
#[derive(Debug)]
pub struct ReportBuilder {
    minecraft_version: String,
    loaders: Vec<String>,
    total_entries: usize,
    dry_run: bool,
    summary: ReportSummary,
    outcomes: Vec<ModOutcome>,
}

impl ReportBuilder {
    pub fn new(minecraft_version: &str, loaders: Vec<String>, total_entries: usize) -> Self {
        Self {
            minecraft_version: minecraft_version.to_string(),
            loaders,
            total_entries,
            dry_run: false,
            summary: ReportSummary::default(),
            outcomes: Vec::with_capacity(total_entries),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn push(&mut self, entry: ModEntry, outcome: ResolutionOutcome) {
        self.summary.record(outcome.kind());
        self.outcomes.push(ModOutcome { entry, outcome });
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn finish(self, cancelled: bool) -> UpdateReport {
        UpdateReport {
            generated_at: Local::now(),
            minecraft_version: self.minecraft_version,
            loaders: self.loaders,
            total_entries: self.total_entries,
            dry_run: self.dry_run,
            cancelled,
            summary: self.summary,
            outcomes: self.outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    include!("report.test.rs");
}
