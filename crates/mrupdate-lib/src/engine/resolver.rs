//! Per-mod resolution as an explicit state machine
//!
//! `Identify -> FetchProject -> FetchVersions -> Filter -> Select -> Done`.
//! Each transition is one registry call or one pure step, so every stage can
//! be driven and inspected on its own.

use super::compat::{CompatibleLoaders, is_usable};
use super::selection::{Selection, SelectionReason, choose, sort_newest_first};
use crate::api::{ModrinthClient, ModrinthError, Project, Version};
use crate::primitives::{LoaderFamily, SideRequirement};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Version number shown when the installed version cannot be identified
pub const UNKNOWN_VERSION: &str = "unknown";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Registry lookup failed while {stage}: {source}")]
    Registry {
        stage: &'static str,
        source: ModrinthError,
    },
}

impl ResolveError {
    fn at(stage: &'static str) -> impl FnOnce(ModrinthError) -> Self {
        move |source| Self::Registry { stage, source }
    }
}

/// Registry identity of a mod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub server_side: SideRequirement,
}

impl ProjectRef {
    /// Placeholder identity for a project id the registry did not know
    pub fn unknown(id: &str) -> Self {
        Self {
            id: id.to_string(),
            slug: id.to_string(),
            title: id.to_string(),
            server_side: SideRequirement::Unknown,
        }
    }
}

impl From<&Project> for ProjectRef {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            slug: project.slug.clone(),
            title: project.title.clone(),
            server_side: project.server_side,
        }
    }
}

/// Run-wide inputs shared by every resolution
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub minecraft_version: String,
    pub loaders: CompatibleLoaders,
    pub has_quilt: bool,
}

impl ResolveContext {
    pub fn new(minecraft_version: &str, families: &[LoaderFamily]) -> Self {
        Self {
            minecraft_version: minecraft_version.to_string(),
            loaders: CompatibleLoaders::from_families(families),
            has_quilt: families.iter().any(LoaderFamily::is_quilt),
        }
    }
}

/// What is known about one installed mod before asking the registry
#[derive(Debug, Clone, Default)]
pub struct ModQuery {
    /// Project id taken from the download URL
    pub url_project_id: Option<String>,
    /// SHA-1 of the installed file, or the manifest's when nothing is installed
    pub sha1: Option<String>,
}

/// Result of resolving one mod, before any file is touched
#[derive(Debug, Clone)]
pub enum Resolution {
    Update {
        project: ProjectRef,
        current: Option<Version>,
        target: Version,
        reason: SelectionReason,
    },
    UpToDate {
        project: ProjectRef,
        current: Version,
    },
    Missing {
        project: ProjectRef,
        reason: MissingReason,
    },
    Unresolved {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingReason {
    ProjectNotFound,
    NoCompatibleVersions,
}

impl std::fmt::Display for MissingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingReason::ProjectNotFound => write!(f, "not found on Modrinth"),
            MissingReason::NoCompatibleVersions => write!(f, "no compatible versions found"),
        }
    }
}

/// Resolver states
#[derive(Debug)]
pub enum ResolveState {
    Identify,
    FetchProject {
        project_id: String,
        current: Option<Version>,
    },
    FetchVersions {
        project: Project,
        current: Option<Version>,
    },
    Filter {
        project: Project,
        current: Option<Version>,
        candidates: Vec<Version>,
    },
    Select {
        project: Project,
        current: Option<Version>,
        usable: Vec<Version>,
    },
    Done(Resolution),
}

/// Pull the project id out of `.../data/<id>/versions/...`
pub fn project_id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let segments: Vec<&str> = path.split('/').collect();

    segments.windows(3).find_map(|window| match window {
        ["data", id, "versions"] if !id.is_empty() => Some(id.to_string()),
        _ => None,
    })
}

pub struct Resolver<'a, C> {
    client: &'a C,
    context: &'a ResolveContext,
}

impl<'a, C: ModrinthClient> Resolver<'a, C> {
    pub fn new(client: &'a C, context: &'a ResolveContext) -> Self {
        Self { client, context }
    }

    /// Drive the state machine to completion
    pub async fn resolve(&self, query: &ModQuery) -> Result<Resolution, ResolveError> {
        let mut state = ResolveState::Identify;

        loop {
            state = match state {
                ResolveState::Done(resolution) => return Ok(resolution),
                other => self.step(other, query).await?,
            };
        }
    }

    /// Advance one state
    pub async fn step(
        &self,
        state: ResolveState,
        query: &ModQuery,
    ) -> Result<ResolveState, ResolveError> {
        trace!(?state, "Resolver step");

        match state {
            ResolveState::Identify => Ok(self.identify(query).await),

            ResolveState::FetchProject {
                project_id,
                current,
            } => {
                let project = self
                    .client
                    .get_project(&project_id)
                    .await
                    .map_err(ResolveError::at("fetching project"))?;

                Ok(match project {
                    Some(project) => ResolveState::FetchVersions { project, current },
                    None => ResolveState::Done(Resolution::Missing {
                        project: ProjectRef::unknown(&project_id),
                        reason: MissingReason::ProjectNotFound,
                    }),
                })
            }

            ResolveState::FetchVersions { project, current } => {
                let candidates = self
                    .client
                    .list_versions(
                        &project.id,
                        &self.context.minecraft_version,
                        &self.context.loaders.tags(),
                    )
                    .await
                    .map_err(ResolveError::at("listing versions"))?;

                Ok(ResolveState::Filter {
                    project,
                    current,
                    candidates,
                })
            }

            ResolveState::Filter {
                project,
                current,
                candidates,
            } => Ok(self.filter(project, current, candidates)),

            ResolveState::Select {
                project,
                current,
                usable,
            } => Ok(ResolveState::Done(self.select(project, current, &usable))),

            done @ ResolveState::Done(_) => Ok(done),
        }
    }

    /// A failed hash lookup counts as a miss; the URL project id still applies
    async fn identify(&self, query: &ModQuery) -> ResolveState {
        let mut project_id = query.url_project_id.clone();
        let mut current = None;

        if let Some(sha1) = &query.sha1 {
            let by_hash = match self.client.get_version_by_hash(sha1).await {
                Ok(found) => found,
                Err(err) => {
                    warn!(%sha1, error = %err, "Hash lookup failed, falling back to download URL");
                    None
                }
            };

            if let Some(version) = by_hash {
                debug!(
                    project_id = %version.project_id,
                    version = %version.version_number,
                    "Identified installed version by hash"
                );
                project_id = Some(version.project_id.clone());
                current = Some(version);
            }
        }

        match project_id {
            Some(project_id) => ResolveState::FetchProject {
                project_id,
                current,
            },
            None => ResolveState::Done(Resolution::Unresolved {
                reason: "Could not determine project ID".to_string(),
            }),
        }
    }

    fn filter(
        &self,
        project: Project,
        current: Option<Version>,
        candidates: Vec<Version>,
    ) -> ResolveState {
        let total = candidates.len();
        let mut usable: Vec<Version> = candidates
            .into_iter()
            .filter(|v| is_usable(v, &self.context.minecraft_version, &self.context.loaders))
            .collect();

        debug!(
            project_id = %project.id,
            total,
            usable = usable.len(),
            "Filtered candidate versions"
        );

        if usable.is_empty() {
            return ResolveState::Done(Resolution::Missing {
                project: ProjectRef::from(&project),
                reason: MissingReason::NoCompatibleVersions,
            });
        }

        sort_newest_first(&mut usable);
        ResolveState::Select {
            project,
            current,
            usable,
        }
    }

    fn select(&self, project: Project, current: Option<Version>, usable: &[Version]) -> Resolution {
        let project_ref = ProjectRef::from(&project);

        match choose(usable, self.context.has_quilt, current.as_ref()) {
            None => Resolution::Missing {
                project: project_ref,
                reason: MissingReason::NoCompatibleVersions,
            },
            Some(Selection {
                version,
                is_newer: true,
                reason,
            }) => Resolution::Update {
                project: project_ref,
                current,
                target: version,
                reason,
            },
            Some(Selection { version, .. }) => Resolution::UpToDate {
                project: project_ref,
                current: current.unwrap_or(version),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    include!("resolver.test.rs");
}
