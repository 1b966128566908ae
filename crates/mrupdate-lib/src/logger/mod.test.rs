use super::*;

#[test]
fn test_default_filter_targets_workspace_crates() {
    let filter = default_filter(LogLevel::Debug);
    assert!(filter.starts_with("mrupdate_lib=debug,mrupdate=debug"));
    assert!(filter.ends_with(",debug"));
}

#[test]
fn test_default_filter_quiets_http_stack() {
    let filter = default_filter(LogLevel::Trace);
    assert!(filter.contains("reqwest=warn"));
    assert!(filter.contains("hyper_util=warn"));
}

#[test]
fn test_default_filter_is_valid_env_filter() {
    for verbosity in 0..=4 {
        let directives = default_filter(LogLevel::from_verbosity(verbosity));
        assert!(EnvFilter::try_new(&directives).is_ok(), "{}", directives);
    }
}

#[test]
fn test_second_init_is_rejected() {
    let config = LoggerConfig {
        level: LogLevel::Error,
        format: LogFormat::Text,
        output: LogOutput::Stderr,
        color: false,
    };

    // Another test in this binary may already have installed a subscriber
    let _ = Logger::init(config.clone());
    assert!(matches!(
        Logger::init(config),
        Err(LoggerError::AlreadyInitialized) | Err(LoggerError::InitializationFailed { .. })
    ));
}
