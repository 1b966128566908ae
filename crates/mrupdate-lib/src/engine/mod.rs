//! # Engine
//!
//! Mod-version resolution and update execution.
//!
//! - [`compat`] - loader and Minecraft version predicates
//! - [`selection`] - ordering and the pick among usable versions
//! - [`resolver`] - per-mod state machine over the registry
//! - [`executor`] - downloads, backups and atomic swaps
//! - [`report`] - outcomes and the run report
//! - [`progress`] - progress events and cancellation
//! - [`run`] - the orchestrating `UpdateEngine`

pub mod compat;
pub mod executor;
pub mod progress;
pub mod report;
pub mod resolver;
pub mod run;
pub mod selection;

pub use compat::{CompatibleLoaders, is_usable, minecraft_version_compatible};
pub use executor::{ExecuteError, Executor, ModsDir};
pub use progress::{CancellationFlag, ChannelProgress, NoProgress, ProgressEvent, ProgressSink};
pub use report::{
    ChosenFile, ModOutcome, OutcomeKind, ReportBuilder, ReportSummary, ResolutionOutcome,
    UpdateReport,
};
pub use resolver::{
    MissingReason, ModQuery, ProjectRef, Resolution, ResolveContext, ResolveError, Resolver,
    project_id_from_url,
};
pub use run::{EngineError, RunOptions, UpdateEngine};
pub use selection::{Selection, SelectionReason};
