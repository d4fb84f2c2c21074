//! Remote URL parsing: which GitHub repository a working copy points at.

use std::fmt;

use url::Url;

/// An `owner/repo` pair identifying a repository on the forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Parse a git remote URL into its owner and repository name.
///
/// Understands scp-style SSH remotes (`git@github.com:owner/repo.git`) and
/// URL remotes (`https://github.com/owner/repo`, `ssh://git@host/owner/repo.git`).
/// Returns `None` for anything else; this is the only failure signal.
pub fn parse_remote_url(url: &str) -> Option<RepoSlug> {
    let url = url.trim();
    let url = url.strip_suffix(".git").unwrap_or(url);

    if url.contains("://") {
        return parse_url_remote(url);
    }

    // scp-style: `[user@]host:owner/repo`. The host part never contains a slash.
    let (host, path) = url.split_once(':')?;
    if host.is_empty() || host.contains('/') {
        return None;
    }
    slug_from_segments(path.split('/'))
}

fn parse_url_remote(url: &str) -> Option<RepoSlug> {
    let parsed = Url::parse(url).ok()?;
    slug_from_segments(parsed.path().trim_matches('/').split('/'))
}

/// Take the first two segments as owner and repo; both must be non-empty.
fn slug_from_segments<'a>(mut segments: impl Iterator<Item = &'a str>) -> Option<RepoSlug> {
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    Some(RepoSlug {
        owner: owner.to_string(),
        repo: repo.to_string(),
    })
}
