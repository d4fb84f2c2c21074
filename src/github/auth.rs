//! Forge authentication probe, run once at startup.

use std::path::Path;

use tracing::debug;

use crate::exec::{CommandRunner, CommandSpec};

/// Whether the `gh` CLI is installed and logged in.
///
/// A missing binary counts as not authenticated. Otherwise `gh auth status`
/// decides: authenticated if it exits cleanly or reports a login. When
/// `gh_config_dir` is set it is exported as `GH_CONFIG_DIR`, so the probe
/// checks the same profile pull requests are fetched with.
pub async fn is_authenticated(
    runner: &dyn CommandRunner,
    gh_config_dir: Option<&Path>,
) -> bool {
    let Some(gh) = locate_gh(runner).await else {
        debug!("gh is not installed");
        return false;
    };

    let mut spec = CommandSpec::new(gh).args(["auth", "status"]);
    if let Some(dir) = gh_config_dir {
        spec = spec.env("GH_CONFIG_DIR", dir.to_string_lossy());
    }

    let output = runner.run(&spec).await;
    let combined = format!("{}{}", output.stdout, output.stderr);

    combined.contains("Logged in") || combined.contains('✓') || output.success()
}

/// Resolve `gh` on the `PATH` with `which` (or `where` on Windows).
async fn locate_gh(runner: &dyn CommandRunner) -> Option<String> {
    let finder = if cfg!(windows) { "where" } else { "which" };
    let output = runner.run(&CommandSpec::new(finder).arg("gh")).await;
    output
        .stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(String::from)
}
