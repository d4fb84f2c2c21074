//! Per-repository fetch: one repository in, its open pull requests and a
//! load status out.
//!
//! A linear pipeline of gates. The first gate that fails ends the fetch
//! with no pull requests and a failed load status naming the reason.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use jiff::Timestamp;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::exec::{CommandRunner, CommandSpec};
use crate::model::{
    BuildStatus, CheckConclusion, LoadStatus, PrState, PullRequest, RepoKind, Repository,
};

use super::{classify, parse_remote_url};

/// Fields requested from `gh pr list --json`.
const PR_FIELDS: &str = "number,title,url,statusCheckRollup,createdAt";

/// How repositories are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPolicy {
    /// Kinds whose path may not resolve on the host, so the directory
    /// check is skipped for them.
    pub directory_check_exempt: HashSet<RepoKind>,

    /// Exported as `GH_CONFIG_DIR` to `gh` when set.
    pub gh_config_dir: Option<PathBuf>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            directory_check_exempt: HashSet::from([RepoKind::Wsl]),
            gh_config_dir: None,
        }
    }
}

impl FetchPolicy {
    pub fn skips_directory_check(&self, kind: RepoKind) -> bool {
        self.directory_check_exempt.contains(&kind)
    }
}

/// A repository that made it through every gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPullRequests {
    pub pull_requests: Vec<PullRequest>,
    pub status: LoadStatus,
}

/// `Ok` when the forge was queried and understood, `Err` with a failed
/// status otherwise.
pub type FetchOutcome = Result<RepoPullRequests, LoadStatus>;

/// Fetch the current user's open pull requests for one repository.
#[instrument(skip_all, fields(repo = %repo.name))]
pub async fn fetch_repository(
    runner: &dyn CommandRunner,
    repo: &Repository,
    policy: &FetchPolicy,
) -> FetchOutcome {
    let fail = |message: &str| {
        info!(reason = message, "skipping repository");
        LoadStatus::failed(&repo.name, message)
    };

    if !repo.has_active_directory && !policy.skips_directory_check(repo.kind) {
        return Err(fail("No active directory found"));
    }

    let user = git(runner, &repo.path, &["config", "user.name"]).await;
    if user.is_empty() {
        return Err(fail("No git user configured"));
    }

    let remote = git(runner, &repo.path, &["config", "--get", "remote.origin.url"]).await;
    if remote.is_empty() {
        return Err(fail("No remote URL found"));
    }

    let Some(slug) = parse_remote_url(&remote) else {
        debug!(%remote, "unrecognized remote");
        return Err(fail("Could not parse GitHub URL"));
    };

    let repo_arg = slug.to_string();
    let mut spec = CommandSpec::new("gh").args([
        "pr",
        "list",
        "--author",
        "@me",
        "--state",
        "open",
        "--json",
        PR_FIELDS,
        "--repo",
        repo_arg.as_str(),
    ]);
    if let Some(dir) = &policy.gh_config_dir {
        spec = spec.env("GH_CONFIG_DIR", dir.to_string_lossy());
    }

    let output = runner.run(&spec).await;
    let json = output.stdout.trim();
    if json.is_empty() {
        if !output.success() {
            warn!(
                %slug,
                exit_code = output.exit_code,
                stderr = output.stderr.trim(),
                "gh pr list printed nothing"
            );
        }
        return Ok(no_open_prs(repo));
    }

    let listings = match serde_json::from_str::<Option<Vec<GhPrListing>>>(json) {
        Ok(Some(listings)) => listings,
        Ok(None) => return Err(fail("Failed to parse PR data")),
        Err(e) => {
            warn!(%slug, error = %e, "could not parse gh output");
            return Err(LoadStatus::failed(&repo.name, format!("Parse error: {e}")));
        }
    };

    if listings.is_empty() {
        return Ok(no_open_prs(repo));
    }

    let pull_requests: Vec<PullRequest> = listings
        .into_iter()
        .map(|listing| listing.into_pull_request(&repo.name, &user))
        .collect();

    info!(count = pull_requests.len(), "loaded pull requests");
    let status = LoadStatus::succeeded(
        &repo.name,
        format!("Loaded {} PR(s)", pull_requests.len()),
    );
    Ok(RepoPullRequests {
        pull_requests,
        status,
    })
}

fn no_open_prs(repo: &Repository) -> RepoPullRequests {
    RepoPullRequests {
        pull_requests: Vec::new(),
        status: LoadStatus::succeeded(&repo.name, "No open PRs"),
    }
}

/// Run a read-only git query against `repo_path` and return trimmed stdout.
///
/// Empty when git is missing, the query fails, or the value is unset.
async fn git(runner: &dyn CommandRunner, repo_path: &Path, args: &[&str]) -> String {
    let spec = CommandSpec::new("git")
        .arg("-C")
        .arg(repo_path.to_string_lossy())
        .args(args.iter().copied());
    runner.run(&spec).await.stdout.trim().to_string()
}

// ── gh JSON shapes ──

/// JSON shape for `gh pr list --json number,title,url,statusCheckRollup,createdAt`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GhPrListing {
    number: u64,
    title: String,
    url: String,
    #[serde(default)]
    status_check_rollup: Option<Vec<GhCheck>>,
    created_at: Timestamp,
}

impl GhPrListing {
    fn into_pull_request(self, repository: &str, author: &str) -> PullRequest {
        let conclusions: Vec<CheckConclusion> = self
            .status_check_rollup
            .unwrap_or_default()
            .iter()
            .map(GhCheck::conclusion)
            .collect();
        let build_status = classify(&conclusions);

        PullRequest {
            title: self.title,
            repository: repository.to_string(),
            number: self.number,
            author: author.to_string(),
            url: self.url,
            state: PrState::Open,
            has_failed_checks: build_status == BuildStatus::Failure,
            build_status,
            created_at: self.created_at,
        }
    }
}

/// One entry of `statusCheckRollup`.
///
/// Check runs carry `status` and `conclusion`; commit status contexts
/// carry `state` instead.
#[derive(Deserialize)]
struct GhCheck {
    conclusion: Option<String>,
    state: Option<String>,
    status: Option<String>,
}

impl GhCheck {
    fn conclusion(&self) -> CheckConclusion {
        let reported = self
            .conclusion
            .as_deref()
            .filter(|c| !c.is_empty())
            .or_else(|| self.state.as_deref().filter(|s| !s.is_empty()));

        if let Some(value) = reported {
            return CheckConclusion::from_forge(value);
        }

        // A check run that hasn't concluded yet.
        match self.status.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("IN_PROGRESS" | "QUEUED" | "WAITING" | "PENDING" | "REQUESTED") => {
                CheckConclusion::InProgress
            }
            _ => CheckConclusion::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::exec::fake::{ScriptedRunner, command_line};
    use crate::exec::{CommandOutput, NOT_RUN};

    const USER: &str = "git -C /src/widgets config user.name";
    const REMOTE: &str = "git -C /src/widgets config --get remote.origin.url";
    const GH: &str = "gh pr list --author @me --state open --json number,title,url,statusCheckRollup,createdAt --repo acme/widgets";

    fn repo() -> Repository {
        Repository {
            name: "widgets".into(),
            path: PathBuf::from("/src/widgets"),
            kind: RepoKind::Code,
            has_active_directory: true,
        }
    }

    fn configured() -> ScriptedRunner {
        ScriptedRunner::new()
            .on(USER, "Ada Lovelace\n")
            .on(REMOTE, "git@github.com:acme/widgets.git\n")
    }

    async fn fetch(runner: &ScriptedRunner, repo: &Repository) -> FetchOutcome {
        fetch_repository(runner, repo, &FetchPolicy::default()).await
    }

    #[tokio::test]
    async fn missing_directory_stops_before_running_anything() {
        let runner = configured();
        let mut repo = repo();
        repo.has_active_directory = false;

        let status = fetch(&runner, &repo).await.unwrap_err();
        assert_eq!(status, LoadStatus::failed("widgets", "No active directory found"));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn exempt_kind_skips_directory_check() {
        let runner = configured().on(GH, "[]");
        let mut repo = repo();
        repo.kind = RepoKind::Wsl;
        repo.has_active_directory = false;

        let fetched = fetch(&runner, &repo).await.unwrap();
        assert_eq!(fetched.status, LoadStatus::succeeded("widgets", "No open PRs"));
    }

    #[tokio::test]
    async fn exemption_is_configurable() {
        let runner = configured().on(GH, "[]");
        let mut repo = repo();
        repo.kind = RepoKind::Studio;
        repo.has_active_directory = false;

        let policy = FetchPolicy {
            directory_check_exempt: HashSet::from([RepoKind::Studio]),
            gh_config_dir: None,
        };
        assert!(fetch_repository(&runner, &repo, &policy).await.is_ok());

        repo.kind = RepoKind::Wsl;
        let status = fetch_repository(&runner, &repo, &policy).await.unwrap_err();
        assert_eq!(status.message, "No active directory found");
    }

    #[tokio::test]
    async fn missing_git_user() {
        let runner = ScriptedRunner::new().on(REMOTE, "git@github.com:acme/widgets.git");
        let status = fetch(&runner, &repo()).await.unwrap_err();
        assert_eq!(status, LoadStatus::failed("widgets", "No git user configured"));
    }

    #[tokio::test]
    async fn missing_remote() {
        let runner = ScriptedRunner::new().on(USER, "Ada Lovelace");
        let status = fetch(&runner, &repo()).await.unwrap_err();
        assert_eq!(status, LoadStatus::failed("widgets", "No remote URL found"));
        assert!(
            runner.calls().iter().all(|c| c.program == "git"),
            "gh must not run without a remote"
        );
    }

    #[tokio::test]
    async fn unparseable_remote() {
        let runner = ScriptedRunner::new()
            .on(USER, "Ada Lovelace")
            .on(REMOTE, "/mnt/backup/widgets");
        let status = fetch(&runner, &repo()).await.unwrap_err();
        assert_eq!(status, LoadStatus::failed("widgets", "Could not parse GitHub URL"));
    }

    #[tokio::test]
    async fn empty_gh_output_means_no_prs() {
        // Unscripted gh behaves like a missing binary: no output at all.
        let runner = configured();
        let fetched = fetch(&runner, &repo()).await.unwrap();
        assert!(fetched.pull_requests.is_empty());
        assert_eq!(fetched.status, LoadStatus::succeeded("widgets", "No open PRs"));
    }

    #[tokio::test]
    async fn empty_array_means_no_prs() {
        let runner = configured().on(GH, "[]\n");
        let fetched = fetch(&runner, &repo()).await.unwrap();
        assert!(fetched.pull_requests.is_empty());
        assert_eq!(fetched.status.message, "No open PRs");
        assert!(fetched.status.success);
    }

    #[tokio::test]
    async fn malformed_output_is_a_parse_error() {
        let runner = configured().on(GH, "{\"message\": \"oops\"");
        let status = fetch(&runner, &repo()).await.unwrap_err();
        assert!(!status.success);
        assert!(status.message.starts_with("Parse error: "), "{}", status.message);
    }

    #[tokio::test]
    async fn null_output_fails() {
        let runner = configured().on(GH, "null");
        let status = fetch(&runner, &repo()).await.unwrap_err();
        assert_eq!(status.message, "Failed to parse PR data");
    }

    #[tokio::test]
    async fn loads_pull_requests_with_build_status() {
        let json = r#"[
            {
                "number": 7,
                "title": "Fix widget crash",
                "url": "https://github.com/acme/widgets/pull/7",
                "createdAt": "2024-03-01T10:00:00Z",
                "statusCheckRollup": [
                    { "__typename": "CheckRun", "name": "ci", "status": "COMPLETED", "conclusion": "SUCCESS" },
                    { "__typename": "StatusContext", "context": "lint", "state": "FAILURE" }
                ]
            },
            {
                "number": 8,
                "title": "Add gadgets",
                "url": "https://github.com/acme/widgets/pull/8",
                "createdAt": "2024-03-02T10:00:00Z",
                "statusCheckRollup": [
                    { "__typename": "CheckRun", "name": "ci", "status": "IN_PROGRESS", "conclusion": "" }
                ]
            },
            {
                "number": 9,
                "title": "Docs",
                "url": "https://github.com/acme/widgets/pull/9",
                "createdAt": "2024-03-03T10:00:00Z",
                "statusCheckRollup": []
            }
        ]"#;
        let runner = configured().on(GH, json);

        let fetched = fetch(&runner, &repo()).await.unwrap();
        assert_eq!(fetched.status, LoadStatus::succeeded("widgets", "Loaded 3 PR(s)"));

        let prs = &fetched.pull_requests;
        assert_eq!(prs.len(), 3);

        assert_eq!(prs[0].number, 7);
        assert_eq!(prs[0].title, "Fix widget crash");
        assert_eq!(prs[0].repository, "widgets");
        assert_eq!(prs[0].author, "Ada Lovelace");
        assert_eq!(prs[0].state, PrState::Open);
        assert_eq!(prs[0].build_status, BuildStatus::Failure);
        assert!(prs[0].has_failed_checks);
        assert_eq!(
            prs[0].created_at,
            "2024-03-01T10:00:00Z".parse::<Timestamp>().unwrap()
        );

        assert_eq!(prs[1].build_status, BuildStatus::Pending);
        assert!(!prs[1].has_failed_checks);

        assert_eq!(prs[2].build_status, BuildStatus::Unknown);
    }

    #[tokio::test]
    async fn missing_rollup_is_unknown() {
        let json = r#"[{
            "number": 1,
            "title": "t",
            "url": "u",
            "createdAt": "2024-01-01T00:00:00Z",
            "statusCheckRollup": null
        }]"#;
        let runner = configured().on(GH, json);
        let fetched = fetch(&runner, &repo()).await.unwrap();
        assert_eq!(fetched.pull_requests[0].build_status, BuildStatus::Unknown);
    }

    #[tokio::test]
    async fn queries_gh_as_the_current_user_with_config_dir() {
        let runner = configured().on_output(
            GH,
            CommandOutput {
                stdout: String::new(),
                stderr: "HTTP 404".into(),
                exit_code: 1,
            },
        );
        let policy = FetchPolicy {
            gh_config_dir: Some(PathBuf::from("/cfg/gh")),
            ..FetchPolicy::default()
        };

        fetch_repository(&runner, &repo(), &policy).await.unwrap();

        let calls = runner.calls();
        let gh = calls.iter().find(|c| c.program == "gh").unwrap();
        assert_eq!(command_line(gh), GH);
        assert!(gh.envs.contains(&("GH_CONFIG_DIR".to_string(), "/cfg/gh".to_string())));
    }

    #[tokio::test]
    async fn missing_git_binary_reads_as_unconfigured_user() {
        let runner = ScriptedRunner::new().on_output(
            USER,
            CommandOutput {
                exit_code: NOT_RUN,
                ..CommandOutput::default()
            },
        );
        let status = fetch(&runner, &repo()).await.unwrap_err();
        assert_eq!(status.message, "No git user configured");
    }

    #[test]
    fn check_conclusions_prefer_conclusion_then_state_then_status() {
        let check = |conclusion: Option<&str>, state: Option<&str>, status: Option<&str>| GhCheck {
            conclusion: conclusion.map(String::from),
            state: state.map(String::from),
            status: status.map(String::from),
        };

        assert_eq!(
            check(Some("SUCCESS"), None, Some("COMPLETED")).conclusion(),
            CheckConclusion::Success
        );
        assert_eq!(check(None, Some("PENDING"), None).conclusion(), CheckConclusion::Pending);
        assert_eq!(
            check(Some(""), None, Some("QUEUED")).conclusion(),
            CheckConclusion::InProgress
        );
        assert_eq!(check(Some("SKIPPED"), None, None).conclusion(), CheckConclusion::Other);
        assert_eq!(check(None, None, None).conclusion(), CheckConclusion::Other);
    }
}
