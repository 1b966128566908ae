//! Configuration loading and global state management

use crate::primitives::ConfigError;
use std::path::Path;
use std::sync::OnceLock;

use super::{cli::CliConfig, config::AppConfig, env::EnvironmentConfig};

static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Env files read in order; earlier files win because dotenvy never overrides
const ENV_FILES: &[&str] = &[".env.local", ".env"];

/// Load the env files that exist; a missing file is not an error
pub fn load_env_files(dir: &Path) -> Result<(), ConfigError> {
    for name in ENV_FILES {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        dotenvy::from_path(&path).map_err(|source| ConfigError::EnvFileError {
            file: path.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

impl AppConfig {
    /// Resolve the final config: defaults -> .env -> env vars -> CLI
    pub fn resolve(cli: AppConfig, env: &EnvironmentConfig) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.color = env.apply_color_config(config.color);
        config = config.merge_with(cli);
        config.validate()?;
        Ok(config)
    }

    /// Initialize global configuration (call once in main)
    pub fn init_global(config: AppConfig) -> Result<&'static AppConfig, ConfigError> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| ConfigError::AlreadyInitialized)?;
        GLOBAL_CONFIG.get().ok_or(ConfigError::AlreadyInitialized)
    }

    /// Global configuration, if initialized
    pub fn global() -> Option<&'static AppConfig> {
        GLOBAL_CONFIG.get()
    }
}

impl CliConfig {
    /// Parse the command line after loading env files, so `MRUPDATE_*`
    /// values from `.env` reach clap's env fallbacks
    pub fn load() -> Result<Self, ConfigError> {
        load_env_files(&std::env::current_dir()?)?;
        Ok(Self::parse_args())
    }
}

#[cfg(test)]
mod tests {
    include!("loader.test.rs");
}
