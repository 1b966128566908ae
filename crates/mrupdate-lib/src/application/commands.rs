//! Command execution handlers

use crate::api::{LiveModrinthClient, RegistryConfig};
use crate::application::cli::UpdateArgs;
use crate::application::env::EnvironmentConfig;
use crate::application::{AppConfig, CliConfig, Commands};
use crate::display::Display;
use crate::engine::{
    CancellationFlag, NoProgress, OutcomeKind, ProgressSink, RunOptions, UpdateEngine,
    UpdateReport,
};
use crate::logger::Logger;
use crate::modpack::{Modpack, PackageOptions, PackageSummary, write_mrpack};
use crate::networking::{NetworkingConfig, NetworkingManager};
use crate::primitives::{ConfigError, LoggerError};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything an update invocation produced
#[derive(Debug)]
pub struct UpdateRun {
    pub report: UpdateReport,
    pub changelog: PathBuf,
    pub packages: Vec<PackageSummary>,
}

/// Execute CLI commands
pub async fn execute_command(config: CliConfig) -> Result<()> {
    let env = EnvironmentConfig::load()?;
    let app_config = AppConfig::resolve(config.app_config, &env)?;

    let stdout_is_term = console::Term::stdout().is_term();
    let colors = app_config
        .color
        .enabled(stdout_is_term || console::Term::stderr().is_term());
    init_logger(&app_config, colors)?;
    init_display(colors, stdout_is_term && !env.is_ci())?;
    let app_config = match AppConfig::init_global(app_config.clone()) {
        Ok(global) => global.clone(),
        Err(ConfigError::AlreadyInitialized) => app_config,
        Err(err) => return Err(err.into()),
    };

    let Some(command) = config.command else {
        let status = Display::status();
        status.message("mrupdate - Modrinth modpack updater");
        status.subtle("Run 'mrupdate --help' for usage information");
        return Ok(());
    };

    match command {
        Commands::Version => handle_version().await,
        Commands::Update(args) => handle_update(&app_config, args).await,
    }
}

fn init_logger(config: &AppConfig, colors: bool) -> Result<()> {
    match Logger::init(config.to_logger_config(colors)) {
        Ok(_) | Err(LoggerError::AlreadyInitialized) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn init_display(colors: bool, interactive: bool) -> Result<()> {
    match Display::init(colors, interactive) {
        Ok(_) | Err(ConfigError::AlreadyInitialized) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

async fn handle_version() -> Result<()> {
    let status = Display::status();
    status.message(&format!("mrupdate {}", env!("CARGO_PKG_VERSION")));
    status.subtle("Modrinth modpack updater");
    let target = format!("Target: {}", std::env::consts::ARCH);
    let registry = format!("Registry: {}", crate::api::DEFAULT_API_URL);
    status.list(&[target.as_str(), registry.as_str()]);
    Ok(())
}

async fn handle_update(config: &AppConfig, args: UpdateArgs) -> Result<()> {
    let cancel = CancellationFlag::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping after the current mod");
                cancel.cancel();
            }
        })
    };

    let cli_progress;
    let progress: &dyn ProgressSink = if args.json {
        &NoProgress
    } else {
        cli_progress = Display::run_progress();
        &cli_progress
    };

    let result = run_update(config, &args, progress, &cancel).await;
    watcher.abort();
    let run = result?;

    if args.json {
        println!("{}", run.report.to_json()?);
    } else {
        print_summary(&run, args.dry_run);
    }

    Ok(())
}

/// Load, update, write the changelog, and package the requested archives
pub async fn run_update(
    config: &AppConfig,
    args: &UpdateArgs,
    progress: &dyn ProgressSink,
    cancel: &CancellationFlag,
) -> Result<UpdateRun> {
    let workdir = config.workdir_or_cwd()?;
    let modpack = Modpack::load(&args.modpack)
        .with_context(|| format!("Failed to load modpack from {}", args.modpack.display()))?;

    info!(
        pack = %modpack.pack_name(),
        index = %modpack.index_path.display(),
        extracted = modpack.is_extracted(),
        "Loaded modpack"
    );

    let networking = NetworkingManager::new(NetworkingConfig::from_settings(
        config.cpu_jobs,
        config.net_timeout,
    ))?;
    let client = LiveModrinthClient::new(
        networking.client().clone(),
        RegistryConfig {
            base_url: config.api_url.clone(),
        },
    );
    let engine = UpdateEngine::new(Arc::new(client), networking);

    let options = RunOptions {
        workdir: workdir.clone(),
        dry_run: args.dry_run,
    };
    let report = engine
        .run(&modpack, &options, progress, cancel)
        .await
        .context("Update run failed")?;

    let output_dir = args.output_dir.clone().unwrap_or_else(|| workdir.clone());
    let pack_name = modpack.pack_name();
    let changelog = args
        .changelog
        .clone()
        .unwrap_or_else(|| output_dir.join(format!("{}_changelog.md", pack_name)));
    write_changelog(&changelog, &report)?;

    let mut packages = Vec::new();
    let modes = args.generation_modes();
    if !modes.is_empty() {
        if args.dry_run || report.cancelled {
            warn!(
                dry_run = args.dry_run,
                cancelled = report.cancelled,
                "Skipping .mrpack generation"
            );
        } else {
            let extras_dir = std::env::current_dir()?;
            for mode in modes {
                let options = PackageOptions {
                    mode,
                    pack_name: pack_name.clone(),
                    output_dir: output_dir.clone(),
                    overrides_dir: args.overrides_folder.clone(),
                    extras_dir: extras_dir.clone(),
                    mods_dir: workdir.join("mods"),
                };
                let summary = write_mrpack(&modpack.manifest, &report, &options)
                    .with_context(|| format!("Failed to write {} modpack", mode))?;
                packages.push(summary);
            }
        }
    }

    Ok(UpdateRun {
        report,
        changelog,
        packages,
    })
}

fn write_changelog(path: &Path, report: &UpdateReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, report.to_markdown())
        .with_context(|| format!("Failed to write changelog {}", path.display()))?;
    info!(path = %path.display(), "Wrote changelog");
    Ok(())
}

fn print_summary(run: &UpdateRun, dry_run: bool) {
    let status = Display::status();
    let summary = &run.report.summary;

    status.section(if dry_run {
        "Update plan (dry run)"
    } else {
        "Update summary"
    });
    status.success("Updated", &summary.updated.to_string());
    status.info(&format!("Already up-to-date: {}", summary.up_to_date));
    if summary.missing > 0 {
        status.warning(&format!("Missing/unavailable: {}", summary.missing));
    }
    let failed = summary.unresolved + summary.errors;
    if failed > 0 {
        status.error("Errors", &failed.to_string());
        let failures = run
            .report
            .of_kind(OutcomeKind::Unresolved)
            .chain(run.report.of_kind(OutcomeKind::Error));
        for item in failures {
            status.subtle(&format!("  {}", item.label()));
        }
    }

    if run.report.cancelled {
        status.warning(&format!(
            "Cancelled after {} of {} mods",
            run.report.outcomes.len(),
            run.report.total_entries
        ));
    }

    status.info(&format!("Changelog: {}", run.changelog.display()));
    for package in &run.packages {
        if package.included == 0 {
            status.warning(&format!(
                "{} contains no mods; nothing could be packaged",
                package.path.display()
            ));
        } else {
            status.success(
                &package.path.display().to_string(),
                &format!("{} mods", package.included),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}
