//! GitHub: my open pull requests across every registered repository.
//!
//! Each repository is resolved to an `owner/repo` slug from its `origin`
//! remote, queried through the `gh` CLI, and its checks reduced to one
//! build status. The per-repository results are merged into a single
//! newest-first list alongside one load status per repository.

mod aggregate;
mod auth;
mod checks;
mod fetch;
mod remote;

pub use aggregate::my_open_pull_requests;
pub use auth::is_authenticated;
pub use checks::classify;
pub use fetch::{FetchPolicy, RepoPullRequests, fetch_repository};
pub use remote::parse_remote_url;
