//! The repository registry: which local working copies Harbour knows about.
//!
//! Backed by a JSON file (`~/.harbour/repos.json` by default):
//!
//! ```text
//! [
//!   { "name": "widgets", "path": "/home/me/src/widgets", "type": "code" },
//!   { "name": "portal",  "path": "~/src/portal",          "type": "wsl" }
//! ]
//! ```
//!
//! Only the read side lives here. Whether each path exists is checked at
//! load time; the file never stores it.

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Deserialize;
use tracing::debug;

use crate::model::{RepoKind, Repository};

/// Errors that can occur while loading the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid registry at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = core::result::Result<T, RegistryError>;

/// One record as written in the registry file.
#[derive(Deserialize)]
struct RepoRecord {
    name: String,
    path: PathBuf,
    #[serde(rename = "type", default = "default_kind")]
    kind: RepoKind,
}

fn default_kind() -> RepoKind {
    RepoKind::Code
}

/// An ordered, read-only set of registered repositories.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    repos: Vec<Repository>,
}

impl Registry {
    /// Loads the registry from `path`.
    ///
    /// A missing file is an empty registry.
    pub fn load(path: &Path) -> Result<Self> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no registry file, starting empty");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(RegistryError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let records: Vec<RepoRecord> =
            serde_json::from_str(&json).map_err(|source| RegistryError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self::from_repositories(records.into_iter().map(|r| {
            let has_active_directory = r.path.is_dir();
            Repository {
                name: r.name,
                path: r.path,
                kind: r.kind,
                has_active_directory,
            }
        })))
    }

    pub fn from_repositories(repos: impl IntoIterator<Item = Repository>) -> Self {
        Self {
            repos: repos.into_iter().collect(),
        }
    }

    /// Every repository, in registry order.
    pub fn all(&self) -> &[Repository] {
        &self.repos
    }

    /// Repositories whose directory existed at load time.
    pub fn active(&self) -> impl Iterator<Item = &Repository> {
        self.repos.iter().filter(|r| r.has_active_directory)
    }

    /// Repositories whose name contains `query`, ignoring case.
    pub fn filtered<'a>(&'a self, query: &str) -> impl Iterator<Item = &'a Repository> + use<'a> {
        let query = query.to_lowercase();
        self.repos
            .iter()
            .filter(move |r| r.name.to_lowercase().contains(&query))
    }

    pub fn by_name(&self, name: &str) -> Option<&Repository> {
        self.repos.iter().find(|r| r.name == name)
    }

    pub fn by_path(&self, path: &Path) -> Option<&Repository> {
        self.repos.iter().find(|r| r.path == path)
    }
}
