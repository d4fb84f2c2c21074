//! Aggregation: every repository's pull requests merged into one view.

use std::any::Any;
use std::cmp::Reverse;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{info, warn};

use crate::exec::CommandRunner;
use crate::model::{LoadStatus, PullRequest, Repository};

use super::{FetchPolicy, RepoPullRequests, fetch_repository};

/// Fetch the current user's open pull requests across `repos`.
///
/// Repositories are processed one at a time, in order, and each produces
/// exactly one load status in the same order. A failure in one repository,
/// including a panic, is recorded in its status and never stops the rest.
///
/// Pull requests come back newest first; ties keep the order they were
/// found in.
pub async fn my_open_pull_requests(
    runner: &dyn CommandRunner,
    repos: &[Repository],
    policy: &FetchPolicy,
) -> (Vec<PullRequest>, Vec<LoadStatus>) {
    let mut pull_requests = Vec::new();
    let mut statuses = Vec::with_capacity(repos.len());

    for repo in repos {
        let fetched = AssertUnwindSafe(fetch_repository(runner, repo, policy))
            .catch_unwind()
            .await;

        match fetched {
            Ok(Ok(RepoPullRequests {
                pull_requests: found,
                status,
            })) => {
                pull_requests.extend(found);
                statuses.push(status);
            }
            Ok(Err(status)) => statuses.push(status),
            Err(panic) => {
                let details = panic_message(panic.as_ref());
                warn!(repo = %repo.name, %details, "repository fetch panicked");
                statuses.push(LoadStatus::failed(
                    &repo.name,
                    format!("Error: {details}"),
                ));
            }
        }
    }

    pull_requests.sort_by_key(|pr| Reverse(pr.created_at));

    info!(
        repositories = repos.len(),
        pull_requests = pull_requests.len(),
        failed = statuses.iter().filter(|s| !s.success).count(),
        "aggregated pull requests"
    );

    (pull_requests, statuses)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unexpected failure".to_string()
    }
}
