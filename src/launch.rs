//! Open a repository in the editor its kind calls for.

use tracing::info;

use crate::exec::{CommandRunner, CommandSpec};
use crate::model::{RepoKind, Repository};

/// The command that opens `repo`, or `None` for kinds with no editor.
pub fn open_command(repo: &Repository, wsl_distribution: &str) -> Option<CommandSpec> {
    let path = repo.path.to_string_lossy().into_owned();
    let spec = match repo.kind {
        RepoKind::Code if cfg!(target_os = "macos") => {
            CommandSpec::new("open").args(["-a", "Visual Studio Code", path.as_str()])
        }
        RepoKind::Code if cfg!(windows) => {
            // `code` is a .cmd shim on Windows, so it needs the shell.
            CommandSpec::new("code").arg(format!("\"{path}\"")).shell(true)
        }
        RepoKind::Code => CommandSpec::new("code").arg(path.as_str()),
        RepoKind::Wsl => CommandSpec::new("wsl.exe")
            .args(["-d", wsl_distribution, "--cd", path.as_str()])
            .args(["--", "bash", "-c", "code .; exec bash"])
            .capture(false, false)
            .suppress_window(false),
        RepoKind::Studio => CommandSpec::new("devenv").arg(path.as_str()),
        RepoKind::Unknown => return None,
    };
    Some(spec)
}

/// Open `repo` in its editor, waiting for the launcher to return.
///
/// Returns whether the launcher exited cleanly.
pub fn open_repository(
    runner: &dyn CommandRunner,
    repo: &Repository,
    wsl_distribution: &str,
) -> Result<bool, String> {
    let spec = open_command(repo, wsl_distribution)
        .ok_or_else(|| format!("repository type '{}' is not supported", repo.kind))?;

    info!(repo = %repo.name, program = %spec.program, "opening repository");
    Ok(runner.run_blocking(&spec).success())
}
