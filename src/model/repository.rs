//! Repository types: local working copies known to the registry.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A local working copy registered with Harbour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// Unique, human-chosen key.
    pub name: String,

    /// Where the working copy lives.
    pub path: PathBuf,

    /// Which environment the repository is opened in.
    pub kind: RepoKind,

    /// Whether `path` existed as a directory when the registry was loaded.
    ///
    /// Recomputed on every load, never read from disk.
    pub has_active_directory: bool,
}

/// The execution environment a repository belongs to.
///
/// Serialized as the registry's `type` strings. Anything unrecognized
/// loads as [`RepoKind::Unknown`] instead of failing the whole registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    /// Opened directly on the host in Visual Studio Code.
    Code,

    /// Lives inside a WSL distribution; its path may not resolve on the host.
    Wsl,

    /// Opened in Visual Studio.
    Studio,

    #[serde(other)]
    Unknown,
}

impl RepoKind {
    /// The registry string for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Wsl => "wsl",
            Self::Studio => "studio",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
