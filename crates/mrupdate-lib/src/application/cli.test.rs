use super::*;
use crate::primitives::{ColorIntent, GenerationMode};
use clap::CommandFactory;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn test_update_defaults() {
    let cli = parse(&["mrupdate", "update", "pack"]);
    let Some(Commands::Update(args)) = cli.command else {
        panic!("expected update command");
    };

    assert_eq!(args.modpack, PathBuf::from("pack"));
    assert_eq!(args.overrides_folder, PathBuf::from("overrides"));
    assert!(!args.dry_run);
    assert!(!args.json);
    assert!(args.generation_modes().is_empty());
}

#[test]
fn test_update_with_all_flags() {
    let cli = parse(&[
        "mrupdate",
        "update",
        "pack.mrpack",
        "--client",
        "--server",
        "--overrides-folder",
        "extra",
        "--output-dir",
        "out",
        "--changelog",
        "notes.md",
        "--dry-run",
        "--json",
    ]);
    let Some(Commands::Update(args)) = cli.command else {
        panic!("expected update command");
    };

    assert_eq!(
        args.generation_modes(),
        vec![GenerationMode::Client, GenerationMode::Server]
    );
    assert_eq!(args.overrides_folder, PathBuf::from("extra"));
    assert_eq!(args.output_dir, Some(PathBuf::from("out")));
    assert_eq!(args.changelog, Some(PathBuf::from("notes.md")));
    assert!(args.dry_run);
    assert!(args.json);
}

#[test]
fn test_global_options_after_subcommand() {
    let cli = parse(&["mrupdate", "update", "pack", "--cpu-jobs", "6", "--color", "never"]);
    assert_eq!(cli.config.cpu_jobs, 6);
    assert_eq!(cli.config.color, ColorIntent::Never);
}

#[test]
fn test_update_requires_modpack() {
    assert!(Cli::try_parse_from(["mrupdate", "update"]).is_err());
}

#[test]
fn test_version_command() {
    let cli = parse(&["mrupdate", "version"]);
    assert!(matches!(cli.command, Some(Commands::Version)));
}

#[test]
fn test_cli_config_from_cli() {
    let config = CliConfig::from(parse(&["mrupdate", "--workdir", "/tmp/pack"]));
    assert!(config.command.is_none());
    assert_eq!(config.app_config.workdir, Some(PathBuf::from("/tmp/pack")));
}
