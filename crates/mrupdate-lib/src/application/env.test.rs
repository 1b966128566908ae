use super::*;

fn env_with(
    no_color: Option<&str>,
    force_color: Option<&str>,
    clicolor: Option<&str>,
    ci: Option<&str>,
) -> EnvironmentConfig {
    EnvironmentConfig {
        no_color: no_color.map(str::to_string),
        force_color: force_color.map(str::to_string),
        clicolor: clicolor.map(str::to_string),
        ci: ci.map(str::to_string),
    }
}

#[test]
fn test_no_color_disables() {
    let env = env_with(Some("1"), None, None, None);
    assert_eq!(env.apply_color_config(ColorIntent::Auto), ColorIntent::Never);
}

#[test]
fn test_force_color_enables() {
    let env = env_with(None, Some("1"), None, None);
    assert_eq!(env.apply_color_config(ColorIntent::Auto), ColorIntent::Always);
}

#[test]
fn test_force_color_wins_over_no_color_and_clicolor() {
    let env = env_with(Some("1"), Some("true"), Some("0"), None);
    assert_eq!(env.apply_color_config(ColorIntent::Auto), ColorIntent::Always);
}

#[test]
fn test_ci_disables_everything() {
    let env = env_with(None, Some("1"), None, Some("true"));
    assert_eq!(env.apply_color_config(ColorIntent::Always), ColorIntent::Never);
    assert!(env.is_ci());
}

#[test]
fn test_empty_no_color_is_ignored() {
    let env = env_with(Some(""), None, None, None);
    assert_eq!(env.apply_color_config(ColorIntent::Auto), ColorIntent::Auto);
}

#[test]
fn test_invalid_force_color_is_ignored() {
    let env = env_with(None, Some("maybe"), None, None);
    assert_eq!(env.apply_color_config(ColorIntent::Never), ColorIntent::Never);
}

#[test]
fn test_load_reads_process_environment() {
    // Only asserts that loading succeeds; the variables themselves vary by host
    assert!(EnvironmentConfig::load().is_ok());
}
