use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::config::AppConfig;

/// mrupdate CLI - Modrinth modpack updater
#[derive(Debug, Clone, Parser)]
#[command(name = "mrupdate")]
#[command(about = "Update a Modrinth modpack's mods to their newest compatible versions")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration options
    #[command(flatten)]
    pub config: AppConfig,

    /// mrupdate commands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration loaded from CLI
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub app_config: AppConfig,
    pub command: Option<Commands>,
}

impl CliConfig {
    pub(crate) fn parse_args() -> Self {
        Self::from(Cli::parse())
    }
}

impl From<Cli> for CliConfig {
    fn from(cli: Cli) -> Self {
        Self {
            app_config: cli.config,
            command: cli.command,
        }
    }
}

/// Available mrupdate commands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Show version information
    Version,

    /// Update every mod in a modpack and write a changelog
    Update(UpdateArgs),
}

/// Arguments for `mrupdate update`
#[derive(Debug, Clone, clap::Args)]
pub struct UpdateArgs {
    /// Modpack directory or `.mrpack` file
    #[arg(help = "Modpack directory or .mrpack file")]
    pub modpack: PathBuf,

    /// Generate a client `.mrpack`
    #[arg(long, help = "Write a client .mrpack after updating")]
    pub client: bool,

    /// Generate a server `.mrpack`
    #[arg(long, help = "Write a server .mrpack after updating")]
    pub server: bool,

    /// Folder copied into the archive's `overrides/`
    #[arg(long, default_value = "overrides")]
    pub overrides_folder: PathBuf,

    /// Where archives and the changelog are written (default: workdir)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Changelog path (default: `<output-dir>/<pack>_changelog.md`)
    #[arg(long)]
    pub changelog: Option<PathBuf>,

    /// Resolve and report without downloading or moving files
    #[arg(long, help = "Show planned changes without applying them")]
    pub dry_run: bool,

    /// Print the report as JSON instead of the human summary
    #[arg(long)]
    pub json: bool,
}

impl UpdateArgs {
    /// Requested archive modes, client first
    pub fn generation_modes(&self) -> Vec<crate::primitives::GenerationMode> {
        use crate::primitives::GenerationMode;

        let mut modes = Vec::new();
        if self.client {
            modes.push(GenerationMode::Client);
        }
        if self.server {
            modes.push(GenerationMode::Server);
        }
        modes
    }
}

#[cfg(test)]
mod tests {
    include!("cli.test.rs");
}
