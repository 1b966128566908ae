use super::*;
use crate::primitives::ColorIntent;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_missing_env_files_are_fine() {
    let temp = TempDir::new().unwrap();
    assert!(load_env_files(temp.path()).is_ok());
}

#[test]
fn test_env_file_values_are_exported() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join(".env"),
        "MRUPDATE_LOADER_TEST_MARKER=from-dotenv\n",
    )
    .unwrap();

    load_env_files(temp.path()).unwrap();
    assert_eq!(
        std::env::var("MRUPDATE_LOADER_TEST_MARKER").unwrap(),
        "from-dotenv"
    );
}

#[test]
fn test_malformed_env_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(".env.local"), "NOT VALID 'LINE\n").unwrap();

    assert!(matches!(
        load_env_files(temp.path()),
        Err(ConfigError::EnvFileError { .. })
    ));
}

#[test]
fn test_resolve_applies_env_then_cli() {
    let env = EnvironmentConfig {
        no_color: Some("1".to_string()),
        ..EnvironmentConfig::default()
    };
    let cli = AppConfig {
        cpu_jobs: 4,
        ..AppConfig::default()
    };

    let config = AppConfig::resolve(cli, &env).unwrap();
    assert_eq!(config.color, ColorIntent::Never);
    assert_eq!(config.cpu_jobs, 4);
    assert!(config.workdir.is_some());
}

#[test]
fn test_resolve_cli_color_overrides_env() {
    let env = EnvironmentConfig {
        no_color: Some("1".to_string()),
        ..EnvironmentConfig::default()
    };
    let cli = AppConfig {
        color: ColorIntent::Always,
        ..AppConfig::default()
    };

    let config = AppConfig::resolve(cli, &env).unwrap();
    assert_eq!(config.color, ColorIntent::Always);
}
