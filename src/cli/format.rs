//! Output formatting for CLI display.

use crate::model::{BuildStatus, LoadStatus, PullRequest, Repository};

fn build_marker(status: BuildStatus) -> &'static str {
    match status {
        BuildStatus::Success => "✓",
        BuildStatus::Failure => "✗",
        BuildStatus::Pending => "…",
        BuildStatus::Unknown => "?",
    }
}

/// One pull request: a headline and its URL on the next line.
pub(super) fn format_pull_request(pr: &PullRequest) -> String {
    format!(
        "{} {}#{}  {}  [{}, opened {}]\n    {}",
        build_marker(pr.build_status),
        pr.repository,
        pr.number,
        pr.title,
        pr.build_status,
        pr.created_at.strftime("%Y-%m-%d"),
        pr.url,
    )
}

pub(super) fn format_load_status(status: &LoadStatus) -> String {
    let mark = if status.success { "ok " } else { "err" };
    format!("{mark} {}: {}", status.repository, status.message)
}

pub(super) fn format_repository(repo: &Repository) -> String {
    let missing = if repo.has_active_directory {
        ""
    } else {
        "  (missing)"
    };
    format!(
        "{}  [{}]  {}{missing}",
        repo.name,
        repo.kind,
        repo.path.display()
    )
}
