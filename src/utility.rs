//! Utility scripts: short shell, PowerShell, or Python snippets kept in
//! `~/.harbour/utilities.json` and run on demand.

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::exec::{CommandRunner, CommandSpec};

/// Errors that can occur while loading utilities.
#[derive(Debug, thiserror::Error)]
pub enum UtilityError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid utilities file at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A named snippet and how to run it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Utility {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub command: String,
    #[serde(rename = "type", default)]
    pub language: ScriptLanguage,
    #[serde(default)]
    pub requires_admin: bool,
}

/// Which interpreter runs a utility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    Powershell,
    Python,
    #[default]
    #[serde(other)]
    Bash,
}

/// What running a utility produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtilityRun {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl Utility {
    /// The interpreter invocation for this utility.
    pub fn command_spec(&self) -> CommandSpec {
        let spec = match self.language {
            ScriptLanguage::Bash => CommandSpec::new("bash").args(["-c", self.command.as_str()]),
            ScriptLanguage::Powershell => {
                CommandSpec::new("powershell").args(["-Command", self.command.as_str()])
            }
            ScriptLanguage::Python => {
                CommandSpec::new("python3").args(["-c", self.command.as_str()])
            }
        };
        spec.elevate(self.requires_admin)
    }

    /// Whether `query` appears in the name or description, ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
    }
}

/// Load utilities from `path`. A missing file means none are configured.
pub fn load_utilities(path: &Path) -> Result<Vec<Utility>, UtilityError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(UtilityError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_str(&json).map_err(|source| UtilityError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Run a utility to completion.
///
/// Elevated runs can't capture output, so they report a fixed message instead.
pub async fn run_utility(runner: &dyn CommandRunner, utility: &Utility) -> UtilityRun {
    info!(utility = %utility.name, elevated = utility.requires_admin, "running utility");
    let output = runner.run(&utility.command_spec()).await;

    if utility.requires_admin {
        return UtilityRun {
            success: output.success(),
            stdout: "No output captured when running elevated".to_string(),
            stderr: String::new(),
        };
    }

    UtilityRun {
        success: output.success(),
        stdout: output.stdout,
        stderr: output.stderr,
    }
}
