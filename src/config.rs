//! Harbour configuration.
//!
//! Loaded from `~/.harbour/config.toml`. Every key is optional; a missing
//! file means defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{fs, io};

use serde::Deserialize;

use crate::github::FetchPolicy;
use crate::model::RepoKind;

/// Errors that can occur while loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config at {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Harbour configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    /// Registry file. Defaults to `~/.harbour/repos.json`.
    pub registry: Option<PathBuf>,

    /// Utility scripts file. Defaults to `~/.harbour/utilities.json`.
    pub utilities: Option<PathBuf>,

    /// Exported as `GH_CONFIG_DIR` to every `gh` call.
    pub gh_config_dir: Option<PathBuf>,

    /// Deadline for each external command. Unlimited when unset.
    pub command_timeout_secs: Option<u64>,

    /// WSL distribution used to open `wsl` repositories.
    pub wsl_distribution: Option<String>,

    /// Per-kind overrides, keyed by registry type (`code`, `wsl`, `studio`).
    #[serde(default)]
    pub kinds: HashMap<String, KindSettings>,
}

/// Settings for one repository kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct KindSettings {
    /// Don't require the repository path to exist before querying it.
    pub skip_directory_check: Option<bool>,
}

impl Config {
    /// Load config from `~/.harbour/config.toml`, or defaults if it is absent.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it is absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The config file path: `~/.harbour/config.toml`.
    pub fn path() -> Option<PathBuf> {
        harbour_dir().map(|d| d.join("config.toml"))
    }

    pub fn registry_path(&self) -> Option<PathBuf> {
        self.registry
            .clone()
            .or_else(|| harbour_dir().map(|d| d.join("repos.json")))
    }

    pub fn utilities_path(&self) -> Option<PathBuf> {
        self.utilities
            .clone()
            .or_else(|| harbour_dir().map(|d| d.join("utilities.json")))
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    pub fn wsl_distribution(&self) -> &str {
        self.wsl_distribution.as_deref().unwrap_or("Ubuntu")
    }

    /// Whether repositories of `kind` skip the directory-existence gate.
    ///
    /// `wsl` paths usually don't resolve from the host, so that kind skips
    /// it unless configured otherwise.
    pub fn skips_directory_check(&self, kind: RepoKind) -> bool {
        self.kinds
            .get(kind.as_str())
            .and_then(|k| k.skip_directory_check)
            .unwrap_or(kind == RepoKind::Wsl)
    }

    /// The pull-request fetch policy this config describes.
    pub fn fetch_policy(&self) -> FetchPolicy {
        let exempt = [
            RepoKind::Code,
            RepoKind::Wsl,
            RepoKind::Studio,
            RepoKind::Unknown,
        ]
        .into_iter()
        .filter(|&kind| self.skips_directory_check(kind))
        .collect();

        FetchPolicy {
            directory_check_exempt: exempt,
            gh_config_dir: self.gh_config_dir.clone(),
        }
    }
}

fn harbour_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".harbour"))
}
