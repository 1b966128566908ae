//! Run orchestration: one outcome per manifest entry, in manifest order

use super::executor::{ExecuteError, Executor, ModsDir};
use super::progress::{CancellationFlag, ProgressEvent, ProgressSink};
use super::report::{ReportBuilder, ResolutionOutcome, UpdateReport};
use super::resolver::{
    ModQuery, ProjectRef, Resolution, ResolveContext, Resolver, UNKNOWN_VERSION,
    project_id_from_url,
};
use crate::api::{FileHashes, ModrinthClient};
use crate::modpack::{ModEntry, Modpack, hashing};
use crate::networking::NetworkingManager;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Run-level failures; anything per-mod becomes an outcome instead
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to prepare mods directory: {source}")]
    ModsDir {
        #[from]
        source: ExecuteError,
    },
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Directory holding `mods/`
    pub workdir: PathBuf,
    /// Resolve and report without downloading or moving anything
    pub dry_run: bool,
}

/// What a background lookup settled on for one mod
enum Lookup {
    Resolved {
        /// SHA-1 of the installed file, when there is one
        live_sha1: Option<String>,
        resolution: Resolution,
    },
    Settled(ResolutionOutcome),
}

type LookupHandle = JoinHandle<Option<Lookup>>;

struct PreparedMod {
    entry: ModEntry,
    lookup: LookupHandle,
}

/// Drives resolver and executor over a modpack
pub struct UpdateEngine<C> {
    client: Arc<C>,
    networking: NetworkingManager,
}

impl<C> UpdateEngine<C>
where
    C: ModrinthClient + Send + Sync + 'static,
{
    pub fn new(client: Arc<C>, networking: NetworkingManager) -> Self {
        Self { client, networking }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Process every manifest entry and return the report
    ///
    /// Registry lookups are prefetched under the networking job limit; file
    /// work happens strictly one mod at a time. Cancellation is honoured
    /// before each mod and yields a partial report.
    pub async fn run(
        &self,
        modpack: &Modpack,
        options: &RunOptions,
        progress: &dyn ProgressSink,
        cancel: &CancellationFlag,
    ) -> Result<UpdateReport, EngineError> {
        let mods = if options.dry_run {
            ModsDir::new(&options.workdir)
        } else {
            ModsDir::prepare(&options.workdir)?
        };

        let context = Arc::new(ResolveContext::new(
            &modpack.minecraft_version,
            &modpack.loaders,
        ));
        let entries = modpack.entries();

        info!(
            minecraft = %modpack.minecraft_version,
            loaders = ?context.loaders.tags(),
            mods = entries.len(),
            jobs = self.networking.jobs(),
            dry_run = options.dry_run,
            "Starting update run"
        );
        progress.emit(ProgressEvent::RunStarted {
            total: entries.len(),
        });

        let prepared: Vec<PreparedMod> = entries
            .iter()
            .map(|entry| self.prepare(entry, &mods, &context))
            .collect();

        let executor = Executor::new(self.client.as_ref(), &mods);
        let mut builder = ReportBuilder::new(
            &modpack.minecraft_version,
            modpack.manifest.loader_identifiers(),
            entries.len(),
        )
        .dry_run(options.dry_run);
        let mut cancelled = false;

        let mut queue = prepared.into_iter().enumerate();
        while let Some((index, item)) = queue.next() {
            if cancel.is_cancelled() {
                for (_, rest) in queue.by_ref() {
                    rest.lookup.abort();
                }
                cancelled = true;
                break;
            }

            let name = item.entry.display_name().to_string();
            progress.emit(ProgressEvent::ModStarted {
                index,
                name: name.clone(),
            });

            let outcome = match item.lookup.await {
                Ok(Some(Lookup::Resolved {
                    live_sha1,
                    resolution,
                })) => {
                    apply(
                        &executor,
                        &item.entry,
                        live_sha1.as_deref(),
                        resolution,
                        options.dry_run,
                    )
                    .await
                }
                Ok(Some(Lookup::Settled(outcome))) => outcome,
                Ok(None) => ResolutionOutcome::Error {
                    project: None,
                    cause: "registry lookup was abandoned".to_string(),
                },
                Err(err) => ResolutionOutcome::Error {
                    project: None,
                    cause: format!("registry lookup task failed: {}", err),
                },
            };

            log_outcome(&name, &outcome);
            progress.emit(ProgressEvent::ModFinished {
                index,
                name,
                kind: outcome.kind(),
                detail: describe(&outcome),
            });
            builder.push(item.entry, outcome);
        }

        if !options.dry_run {
            mods.cleanup_staging();
        }

        let processed = builder.len();
        let report = builder.finish(cancelled);

        if cancelled {
            warn!(processed, total = entries.len(), "Update run cancelled");
            progress.emit(ProgressEvent::Cancelled {
                processed,
                total: entries.len(),
            });
        } else {
            progress.emit(ProgressEvent::finished(&report));
        }

        Ok(report)
    }

    /// Find the installed file and start its registry lookup
    fn prepare(
        &self,
        entry: &ModEntry,
        mods: &ModsDir,
        context: &Arc<ResolveContext>,
    ) -> PreparedMod {
        let live_path = entry
            .file_name()
            .map(|name| mods.live_path(name))
            .filter(|path| path.is_file());

        let client = Arc::clone(&self.client);
        let context = Arc::clone(context);
        let task_entry = entry.clone();
        let lookup = self.networking.spawn_bounded(async move {
            resolve_mod(client.as_ref(), context.as_ref(), &task_entry, live_path).await
        });

        PreparedMod {
            entry: entry.clone(),
            lookup,
        }
    }
}

/// Hash the installed file, then ask the registry what it is
async fn resolve_mod<C: ModrinthClient>(
    client: &C,
    context: &ResolveContext,
    entry: &ModEntry,
    live_path: Option<PathBuf>,
) -> Lookup {
    let live_sha1 = match live_path {
        Some(path) => match hash_live_file(path).await {
            Ok(hash) => Some(hash),
            Err(cause) => {
                return Lookup::Settled(ResolutionOutcome::Error {
                    project: None,
                    cause,
                });
            }
        },
        None => None,
    };

    if entry.downloads.is_empty() && entry.sha1().is_none() && live_sha1.is_none() {
        return Lookup::Settled(ResolutionOutcome::Unresolved {
            reason: "No download URL or hash".to_string(),
        });
    }

    let query = ModQuery {
        url_project_id: entry.first_download().and_then(project_id_from_url),
        sha1: live_sha1
            .clone()
            .or_else(|| entry.sha1().map(str::to_string)),
    };
    debug!(file = entry.display_name(), ?query, "Looking up mod");

    match Resolver::new(client, context).resolve(&query).await {
        Ok(resolution) => Lookup::Resolved {
            live_sha1,
            resolution,
        },
        Err(err) => Lookup::Settled(ResolutionOutcome::Error {
            project: None,
            cause: err.to_string(),
        }),
    }
}

/// SHA-1 of a live file, computed on the blocking pool
async fn hash_live_file(path: PathBuf) -> Result<String, String> {
    let shown = path.display().to_string();

    tokio::task::spawn_blocking(move || hashing::sha1_file(&path))
        .await
        .map_err(|err| format!("Hashing task for {} failed: {}", shown, err))?
        .map_err(|err| format!("Failed to hash {}: {}", shown, err))
}

/// Turn a resolution into an outcome, touching files unless dry-running
async fn apply<C: ModrinthClient>(
    executor: &Executor<'_, C>,
    entry: &ModEntry,
    live_sha1: Option<&str>,
    resolution: Resolution,
    dry_run: bool,
) -> ResolutionOutcome {
    match resolution {
        Resolution::Unresolved { reason } => ResolutionOutcome::Unresolved { reason },

        Resolution::Missing { project, reason } => ResolutionOutcome::Missing {
            project_ref: project,
            reason,
        },

        Resolution::Update {
            project,
            current,
            target,
            ..
        } => {
            let Some(file) = target.primary_file() else {
                return failed(
                    project,
                    ExecuteError::NoFiles {
                        version: target.version_number.clone(),
                    },
                );
            };
            let live_name = entry.file_name().unwrap_or(file.filename.as_str());

            if !dry_run {
                if let Err(err) = executor.install_update(live_name, file).await {
                    return failed(project, err);
                }
            }

            ResolutionOutcome::Updated {
                project,
                old_version: current
                    .map(|v| v.version_number)
                    .unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
                new_version: target.version_number.clone(),
                chosen_file: file.into(),
            }
        }

        Resolution::UpToDate { project, current } => {
            let resolved = current.primary_file();
            // The hash lookup found `current` through this exact file
            let installed = live_sha1.and_then(|sha1| {
                current
                    .files
                    .iter()
                    .find(|file| file.hashes.sha1.eq_ignore_ascii_case(sha1))
            });

            if live_sha1.is_none() && !dry_run {
                // Prefer what the manifest declares, then the registry's file
                let source = match (entry.first_download(), resolved) {
                    (Some(url), _) => Some((url, manifest_hashes(entry))),
                    (None, Some(file)) => Some((file.url.as_str(), Some(file.hashes.clone()))),
                    (None, None) => None,
                };
                let live_name = entry
                    .file_name()
                    .or(resolved.map(|file| file.filename.as_str()));

                match (source, live_name) {
                    (Some((url, hashes)), Some(name)) => {
                        let restored = executor.restore_missing(name, url, hashes.as_ref()).await;
                        if let Err(err) = restored {
                            return failed(project, err);
                        }
                    }
                    _ => {
                        return ResolutionOutcome::Error {
                            project: Some(project),
                            cause: "No download available for the installed version".to_string(),
                        };
                    }
                }
            }

            ResolutionOutcome::UpToDate {
                project,
                version: current.version_number.clone(),
                resolved_file: resolved.map(Into::into),
                installed_file: installed.map(Into::into),
            }
        }
    }
}

fn manifest_hashes(entry: &ModEntry) -> Option<FileHashes> {
    entry.sha1().map(|sha1| FileHashes {
        sha1: sha1.to_string(),
        sha512: entry.hashes.sha512.clone(),
    })
}

fn failed(project: ProjectRef, err: ExecuteError) -> ResolutionOutcome {
    ResolutionOutcome::Error {
        project: Some(project),
        cause: err.to_string(),
    }
}

/// One-line description for progress output
pub fn describe(outcome: &ResolutionOutcome) -> String {
    match outcome {
        ResolutionOutcome::Updated {
            old_version,
            new_version,
            ..
        } => format!("Updated {} -> {}", old_version, new_version),
        ResolutionOutcome::UpToDate { version, .. } => format!("Already up-to-date ({})", version),
        ResolutionOutcome::Missing { reason, .. } => reason.to_string(),
        ResolutionOutcome::Unresolved { reason } => reason.clone(),
        ResolutionOutcome::Error { cause, .. } => cause.clone(),
    }
}

fn log_outcome(name: &str, outcome: &ResolutionOutcome) {
    match outcome {
        ResolutionOutcome::Updated { .. } | ResolutionOutcome::UpToDate { .. } => {
            info!(file = name, "{}", describe(outcome))
        }
        ResolutionOutcome::Missing { .. } | ResolutionOutcome::Unresolved { .. } => {
            warn!(file = name, "{}", describe(outcome))
        }
        ResolutionOutcome::Error { .. } => error!(file = name, "{}", describe(outcome)),
    }
}

#[cfg(test)]
mod tests {
    include!("run.test.rs");
}
