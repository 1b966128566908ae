//! # mrupdate Library
//!
//! Updates the mods of a Modrinth modpack to their newest compatible
//! versions, records what changed, and can repackage the result as
//! client/server `.mrpack` archives.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Foundation types, errors, and shared domain enums
//! - [`logger`] - Structured logging with progress-bar integration
//! - [`networking`] - HTTP client construction and bounded concurrency
//! - [`api`] - Modrinth registry client and its test double
//! - [`modpack`] - Manifest loading, hashing, archive extraction, packaging
//! - [`engine`] - Version resolution, update execution, and reporting
//! - [`display`] - Terminal status lines and progress bars
//! - [`application`] - CLI interface and configuration management
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! mrupdate_lib::main().await
//! # }
//! ```

pub mod api;
pub mod application;
pub mod display;
pub mod engine;
pub mod logger;
pub mod modpack;
pub mod networking;
pub mod primitives;

pub use application::{AppConfig, Cli, Commands, execute_command};
pub use engine::{
    CancellationFlag, ProgressEvent, ProgressSink, ResolutionOutcome, RunOptions, UpdateEngine,
    UpdateReport,
};
pub use logger::Logger;
pub use modpack::Modpack;
pub use networking::{NetworkingConfig, NetworkingManager};
pub use primitives::{
    ColorIntent, ConfigError, GenerationMode, LogFormat, LogLevel, LogOutput, LoggerError,
};

use anyhow::Result;
use application::CliConfig;

pub async fn main() -> Result<()> {
    let config = CliConfig::load()?;
    execute_command(config).await
}
