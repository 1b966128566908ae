use super::*;

#[test]
fn test_defaults_match_sequential_baseline() {
    let config = AppConfig::default();
    assert_eq!(config.cpu_jobs, 1);
    assert_eq!(config.net_timeout, 0);
    assert_eq!(config.api_url, "https://api.modrinth.com/v2");
    assert_eq!(config.color, ColorIntent::Auto);
    assert_eq!(config.log_format, LogFormat::Text);
}

#[test]
fn test_merge_takes_non_default_values() {
    let base = AppConfig::default();
    let override_config = AppConfig {
        cpu_jobs: 8,
        api_url: "http://127.0.0.1:9999".to_string(),
        color: ColorIntent::Never,
        workdir: Some(PathBuf::from("/srv/pack")),
        ..AppConfig::default()
    };

    let merged = base.merge_with(override_config);
    assert_eq!(merged.cpu_jobs, 8);
    assert_eq!(merged.api_url, "http://127.0.0.1:9999");
    assert_eq!(merged.color, ColorIntent::Never);
    assert_eq!(merged.workdir, Some(PathBuf::from("/srv/pack")));
    assert_eq!(merged.net_timeout, 0);
}

#[test]
fn test_merge_keeps_base_when_other_is_default() {
    let base = AppConfig {
        log_level: 4,
        ..AppConfig::default()
    };

    let merged = base.merge_with(AppConfig::default());
    assert_eq!(merged.log_level, 4);
}

#[test]
fn test_validate_fills_workdir() {
    let mut config = AppConfig::default();
    config.validate().unwrap();
    assert!(config.workdir.is_some());
}

#[test]
fn test_validate_rejects_zero_jobs() {
    let mut config = AppConfig {
        cpu_jobs: 0,
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationFailed { .. })
    ));
}

#[test]
fn test_validate_rejects_file_workdir() {
    let temp = tempfile::NamedTempFile::new().unwrap();
    let mut config = AppConfig {
        workdir: Some(temp.path().to_path_buf()),
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidWorkDir { .. })
    ));
}

#[test]
fn test_validate_rejects_non_http_api_url() {
    let mut config = AppConfig {
        api_url: "ftp://example.com".to_string(),
        ..AppConfig::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::ParseError { .. })));
}

#[test]
fn test_logger_config_maps_verbosity() {
    let config = AppConfig {
        log_level: 3,
        ..AppConfig::default()
    };
    let logger = config.to_logger_config(false);
    assert_eq!(logger.level, LogLevel::Debug);
    assert!(!logger.color);
}
