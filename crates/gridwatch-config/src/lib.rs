//! Configuration loading for gridwatch tools.
//!
//! Settings come from a TOML file overlaid by `GRIDWATCH_`-prefixed
//! environment variables, so a wallboard kiosk can be provisioned with
//! a file while the API token stays in the environment:
//!
//! ```toml
//! gateway_url = "https://nms.example.net"
//! poll_interval = "2s"
//! ```
//!
//! ```sh
//! GRIDWATCH_API_TOKEN=… gridwatch
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use gridwatch_core::PollInterval;

/// Errors from configuration loading or path resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration invalid: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("no home directory found — set cache_file explicitly")]
    NoProjectDirs,
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}

/// Resolved wallboard configuration.
#[derive(Debug, Deserialize)]
pub struct GridwatchConfig {
    /// Base URL of the fleet gateway.
    pub gateway_url: Url,

    /// API token presented as `X-API-Token`. Usually supplied via the
    /// `GRIDWATCH_API_TOKEN` environment variable.
    pub api_token: SecretString,

    /// Default poll cadence; changeable at runtime from the wallboard.
    #[serde(default)]
    pub poll_interval: PollInterval,

    /// Override for the local config cache file. Defaults to the
    /// platform cache directory.
    #[serde(default)]
    pub cache_file: Option<PathBuf>,

    /// Override for the log file directory. Defaults to the platform
    /// cache directory.
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl GridwatchConfig {
    /// Load configuration.
    ///
    /// `explicit_path` (from `--config`) wins over the default location;
    /// a missing file is fine as long as the environment supplies the
    /// required values. Environment variables always take precedence.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new();

        let path = explicit_path
            .map(Path::to_path_buf)
            .or_else(default_config_path);
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }

        let config = figment
            .merge(Env::prefixed("GRIDWATCH_"))
            .extract::<Self>()?;
        Ok(config)
    }

    /// Path of the local config cache file.
    pub fn cache_file(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.cache_file {
            return Ok(path.clone());
        }
        let dirs = project_dirs().ok_or(ConfigError::NoProjectDirs)?;
        Ok(dirs.cache_dir().join("wallboard.json"))
    }

    /// Directory the wallboard logs into (the alternate screen must stay
    /// clean, so logging always goes to a file).
    pub fn log_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.log_dir {
            return Ok(path.clone());
        }
        let dirs = project_dirs().ok_or(ConfigError::NoProjectDirs)?;
        Ok(dirs.cache_dir().to_path_buf())
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "gridwatch")
}

fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("gridwatch.toml"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn loads_file_with_env_overlay() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "gridwatch.toml",
                r#"
                    gateway_url = "https://nms.example.net"
                    api_token = "from-file"
                    poll_interval = "5s"
                "#,
            )?;
            jail.set_env("GRIDWATCH_API_TOKEN", "from-env");

            let config = GridwatchConfig::load(Some(Path::new("gridwatch.toml"))).unwrap();
            assert_eq!(config.gateway_url.as_str(), "https://nms.example.net/");
            assert_eq!(config.api_token.expose_secret(), "from-env");
            assert_eq!(config.poll_interval, PollInterval::FiveSeconds);
            Ok(())
        });
    }

    #[test]
    fn env_alone_is_sufficient() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRIDWATCH_GATEWAY_URL", "http://10.0.0.5:9000");
            jail.set_env("GRIDWATCH_API_TOKEN", "tok");

            let config = GridwatchConfig::load(None).unwrap();
            assert_eq!(config.gateway_url.port(), Some(9000));
            assert_eq!(config.poll_interval, PollInterval::TwoSeconds);
            Ok(())
        });
    }

    #[test]
    fn missing_required_values_fail() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRIDWATCH_GATEWAY_URL", "http://10.0.0.5");

            assert!(GridwatchConfig::load(None).is_err());
            Ok(())
        });
    }

    #[test]
    fn cache_file_override_wins() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("GRIDWATCH_GATEWAY_URL", "http://10.0.0.5");
            jail.set_env("GRIDWATCH_API_TOKEN", "tok");
            jail.set_env("GRIDWATCH_CACHE_FILE", "/tmp/wb.json");

            let config = GridwatchConfig::load(None).unwrap();
            assert_eq!(config.cache_file().unwrap(), PathBuf::from("/tmp/wb.json"));
            Ok(())
        });
    }
}
