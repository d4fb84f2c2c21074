//! Pull request and per-repository load outcome.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::BuildStatus;

/// One open pull request authored by the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub title: String,

    /// Name of the registered repository this PR was found in.
    pub repository: String,

    /// Forge-assigned, unique within a repository.
    pub number: u64,

    pub author: String,
    pub url: String,
    pub state: PrState,

    /// True exactly when `build_status` is [`BuildStatus::Failure`].
    pub has_failed_checks: bool,

    pub build_status: BuildStatus,

    /// Global sort key for the aggregated view.
    pub created_at: Timestamp,
}

/// Pull request lifecycle state.
///
/// Aggregation only ever produces `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrState {
    Open,
}

/// Outcome of loading one repository's pull requests.
///
/// Exactly one is produced per repository per aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatus {
    pub repository: String,
    pub success: bool,

    /// Why it failed, how many PRs were loaded, or that there were none.
    pub message: String,
}

impl LoadStatus {
    pub fn succeeded(repository: &str, message: impl Into<String>) -> Self {
        Self {
            repository: repository.to_string(),
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(repository: &str, message: impl Into<String>) -> Self {
        Self {
            repository: repository.to_string(),
            success: false,
            message: message.into(),
        }
    }
}
