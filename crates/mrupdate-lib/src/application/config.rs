//! Application configuration management
//!
//! Handles config loading, validation, and environment variable processing
//! following the precedence: defaults -> .env -> env vars -> CLI args.

use crate::api::DEFAULT_API_URL;
use crate::primitives::*;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

/// Default configuration values
pub mod defaults {
    pub const LOG_LEVEL: &str = "2";
    pub const LOG_FORMAT: &str = "text";
    pub const NET_TIMEOUT: &str = "0";
    pub const CPU_JOBS: &str = "1";
    pub const LOG_OUTPUT: &str = "stderr";
    pub const COLOR: &str = "auto";
    pub const API_URL: &str = super::DEFAULT_API_URL;
}

/// Default value functions for configuration fields
mod default_fns {
    use super::*;

    pub fn log_level() -> u8 {
        2
    }

    pub fn log_format() -> LogFormat {
        LogFormat::Text
    }

    pub fn net_timeout() -> u64 {
        0
    }

    pub fn cpu_jobs() -> usize {
        1
    }

    pub fn log_output() -> LogOutput {
        LogOutput::Stderr
    }

    pub fn color() -> ColorIntent {
        ColorIntent::Auto
    }

    pub fn api_url() -> String {
        defaults::API_URL.to_string()
    }
}

/// Application configuration structure
#[derive(Debug, Clone, Parser, Deserialize)]
pub struct AppConfig {
    /// Directory containing the live `mods/` folder
    #[arg(short, long, global = true, env = "MRUPDATE_WORKDIR")]
    #[serde(default)]
    pub workdir: Option<PathBuf>,

    /// Number of concurrent registry lookups
    #[arg(
        short = 'j',
        long,
        global = true,
        env = "MRUPDATE_CPU_JOBS",
        default_value = defaults::CPU_JOBS
    )]
    #[serde(default = "default_fns::cpu_jobs")]
    pub cpu_jobs: usize,

    /// Request timeout in seconds (0 disables the timeout)
    #[arg(
        short,
        long,
        global = true,
        env = "MRUPDATE_NET_TIMEOUT",
        default_value = defaults::NET_TIMEOUT
    )]
    #[serde(default = "default_fns::net_timeout")]
    pub net_timeout: u64,

    /// Modrinth API base URL
    #[arg(long, global = true, env = "MRUPDATE_API_URL", default_value = defaults::API_URL)]
    #[serde(default = "default_fns::api_url")]
    pub api_url: String,

    /// Verbosity level (0=error, 1=warn, 2=info, 3=debug, 4=trace)
    #[arg(long, global = true, env = "MRUPDATE_LOG_LEVEL", default_value = defaults::LOG_LEVEL)]
    #[serde(default = "default_fns::log_level")]
    pub log_level: u8,

    /// Log format (text, json, yaml)
    #[arg(long, global = true, env = "MRUPDATE_LOG_FORMAT", default_value = defaults::LOG_FORMAT)]
    #[serde(default = "default_fns::log_format")]
    pub log_format: LogFormat,

    /// Log output stream (stderr, stdout)
    #[arg(long, global = true, env = "MRUPDATE_LOG_OUTPUT", default_value = defaults::LOG_OUTPUT)]
    #[serde(default = "default_fns::log_output")]
    pub log_output: LogOutput,

    /// Color output control (auto, always, never)
    #[arg(short, long, global = true, env = "MRUPDATE_COLOR", default_value = defaults::COLOR)]
    #[serde(default = "default_fns::color")]
    pub color: ColorIntent,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workdir: None,
            cpu_jobs: default_fns::cpu_jobs(),
            net_timeout: default_fns::net_timeout(),
            api_url: default_fns::api_url(),
            log_level: default_fns::log_level(),
            log_format: default_fns::log_format(),
            log_output: default_fns::log_output(),
            color: default_fns::color(),
        }
    }
}

impl AppConfig {
    /// Logger settings for a resolved color decision
    pub fn to_logger_config(&self, color: bool) -> LoggerConfig {
        LoggerConfig {
            level: LogLevel::from_verbosity(self.log_level),
            format: self.log_format,
            output: self.log_output,
            color,
        }
    }

    /// Merge this config with another, taking non-default values from other
    pub fn merge_with(mut self, other: Self) -> Self {
        if other.workdir.is_some() {
            self.workdir = other.workdir;
        }

        if other.log_level != default_fns::log_level() {
            self.log_level = other.log_level;
        }
        if other.net_timeout != default_fns::net_timeout() {
            self.net_timeout = other.net_timeout;
        }
        if other.cpu_jobs != default_fns::cpu_jobs() {
            self.cpu_jobs = other.cpu_jobs;
        }
        if other.api_url != default_fns::api_url() {
            self.api_url = other.api_url;
        }

        if !matches!(other.log_format, LogFormat::Text) {
            self.log_format = other.log_format;
        }
        if !matches!(other.log_output, LogOutput::Stderr) {
            self.log_output = other.log_output;
        }
        if !matches!(other.color, ColorIntent::Auto) {
            self.color = other.color;
        }

        self
    }

    /// Validate the final configuration
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.workdir.is_none() {
            self.workdir = Some(std::env::current_dir()?);
        }

        if let Some(workdir) = &self.workdir
            && workdir.exists()
            && !workdir.is_dir()
        {
            return Err(ConfigError::InvalidWorkDir {
                path: workdir.display().to_string(),
            });
        }

        if self.cpu_jobs == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "cpu-jobs must be at least 1".to_string(),
            });
        }

        if self.log_level > 4 {
            return Err(ConfigError::ValidationFailed {
                reason: format!("log-level {} is out of range 0..=4", self.log_level),
            });
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err(ConfigError::ParseError {
                value: self.api_url.clone(),
                reason: "api-url must be an http(s) URL".to_string(),
            });
        }

        Ok(())
    }

    /// The working directory, falling back to the current directory
    pub fn workdir_or_cwd(&self) -> Result<PathBuf, ConfigError> {
        match &self.workdir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }
}

#[cfg(test)]
mod tests {
    include!("config.test.rs");
}
