//! Core data model for Harbour.
//!
//! Repositories come from the registry; pull requests and load statuses
//! are produced fresh by every aggregation run and never persisted.

mod check;
mod pull_request;
mod repository;

pub use check::{BuildStatus, CheckConclusion};
pub use pull_request::{LoadStatus, PrState, PullRequest};
pub use repository::{RepoKind, Repository};
