//! Command execution: run external programs and collect what they printed.
//!
//! Every git, gh, editor, and utility invocation goes through here.
//! A program that cannot be started is reported as exit code `-1` with
//! empty output rather than as an error; callers treat "could not run"
//! and "ran and failed" the same way. There is no retry.

use std::fmt::Write as _;
use std::io;
use std::path::PathBuf;
use std::process::{self, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tracing::debug;

#[cfg(test)]
pub mod fake;

/// Exit code reported when a process could not be started, was killed by a
/// signal, or timed out.
pub const NOT_RUN: i32 = -1;

/// What to run and how.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub current_dir: Option<PathBuf>,
    pub envs: Vec<(String, String)>,
    pub capture_stdout: bool,
    pub capture_stderr: bool,

    /// Run through the platform shell (`sh -c` / `cmd /C`).
    pub shell: bool,

    /// Don't open a console window (Windows only).
    pub suppress_window: bool,

    /// Run with elevated privileges. Output is never captured.
    pub elevate: bool,
}

impl CommandSpec {
    /// A command that captures both streams and opens no window.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            envs: Vec::new(),
            capture_stdout: true,
            capture_stderr: true,
            shell: false,
            suppress_window: true,
            elevate: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn capture(mut self, stdout: bool, stderr: bool) -> Self {
        self.capture_stdout = stdout;
        self.capture_stderr = stderr;
        self
    }

    #[must_use]
    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    #[must_use]
    pub fn suppress_window(mut self, suppress: bool) -> Self {
        self.suppress_window = suppress;
        self
    }

    #[must_use]
    pub fn elevate(mut self, elevate: bool) -> Self {
        self.elevate = elevate;
        self
    }

    /// The program and arguments actually handed to the OS, after applying
    /// shell and elevation wrapping.
    pub fn invocation(&self) -> (String, Vec<String>) {
        let (program, args) = if self.shell {
            let line = std::iter::once(self.program.as_str())
                .chain(self.args.iter().map(String::as_str))
                .collect::<Vec<_>>()
                .join(" ");
            if cfg!(windows) {
                ("cmd".to_string(), vec!["/C".to_string(), line])
            } else {
                ("sh".to_string(), vec!["-c".to_string(), line])
            }
        } else {
            (self.program.clone(), self.args.clone())
        };

        if !self.elevate {
            return (program, args);
        }

        if cfg!(windows) {
            let mut script = format!(
                "Start-Process -FilePath '{}' -Verb RunAs -Wait",
                ps_quote(&program)
            );
            if !args.is_empty() {
                let list = args
                    .iter()
                    .map(|a| format!("'{}'", ps_quote(a)))
                    .collect::<Vec<_>>()
                    .join(",");
                let _ = write!(script, " -ArgumentList {list}");
            }
            (
                "powershell".to_string(),
                vec!["-NoProfile".to_string(), "-Command".to_string(), script],
            )
        } else {
            let mut wrapped = vec![program];
            wrapped.extend(args);
            ("sudo".to_string(), wrapped)
        }
    }

    fn captures_stdout(&self) -> bool {
        self.capture_stdout && !self.elevate
    }

    fn captures_stderr(&self) -> bool {
        self.capture_stderr && !self.elevate
    }

    /// Build the std command with stdio, directory, env and window flags applied.
    fn build(&self) -> process::Command {
        let (program, args) = self.invocation();
        let mut command = process::Command::new(program);
        push_args(&mut command, &args, self.shell && !self.elevate);
        command.stdin(Stdio::null());
        command.stdout(if self.captures_stdout() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        command.stderr(if self.captures_stderr() {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        if let Some(dir) = &self.current_dir {
            command.current_dir(dir);
        }
        for (key, value) in &self.envs {
            command.env(key, value);
        }

        #[cfg(windows)]
        if self.suppress_window {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        command
    }
}

/// `cmd /C` parses its own command line, so shell-mode arguments go to it
/// verbatim instead of through the usual MSVC quoting.
#[cfg(windows)]
fn push_args(command: &mut process::Command, args: &[String], raw: bool) {
    use std::os::windows::process::CommandExt;
    if raw {
        for arg in args {
            command.raw_arg(arg);
        }
    } else {
        command.args(args);
    }
}

#[cfg(not(windows))]
fn push_args(command: &mut process::Command, args: &[String], _raw: bool) {
    command.args(args);
}

/// Single-quote escaping for PowerShell string literals.
fn ps_quote(s: &str) -> String {
    s.replace('\'', "''")
}

/// What a finished process printed and how it exited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    fn not_run(stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: NOT_RUN,
        }
    }

    fn from_output(output: &process::Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(NOT_RUN),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Something that can run a [`CommandSpec`] to completion.
///
/// The seam between the forge logic and real processes; tests swap in a
/// scripted runner. Both modes return only once the process has exited.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command, suspending the caller until the process has exited.
    async fn run(&self, spec: &CommandSpec) -> CommandOutput;

    /// Run the command, blocking the current thread until the process exits.
    fn run_blocking(&self, spec: &CommandSpec) -> CommandOutput;
}

/// Runs commands as real OS processes.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill any async call that runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput {
        debug!(program = %spec.program, args = ?spec.args, "running command");

        let mut std_command = spec.build();
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            std_command.process_group(0);
        }

        let mut command = tokio::process::Command::from(std_command);
        command.kill_on_drop(true);

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                debug!(program = %spec.program, error = %e, "failed to start command");
                return CommandOutput::not_run(String::new());
            }
        };

        let result = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, collect(&mut child)).await;
                if let Ok(result) = waited {
                    result
                } else {
                    debug!(program = %spec.program, ?limit, "command timed out");
                    terminate(&mut child).await;
                    let message = format!("timed out after {}s", limit.as_secs());
                    return CommandOutput::not_run(message);
                }
            }
            None => collect(&mut child).await,
        };

        match result {
            Ok(output) => CommandOutput::from_output(&output),
            Err(e) => {
                debug!(program = %spec.program, error = %e, "failed waiting for command");
                CommandOutput::not_run(String::new())
            }
        }
    }

    /// The timeout only applies to async runs.
    fn run_blocking(&self, spec: &CommandSpec) -> CommandOutput {
        debug!(program = %spec.program, args = ?spec.args, "running command (blocking)");
        match spec.build().output() {
            Ok(output) => CommandOutput::from_output(&output),
            Err(e) => {
                debug!(program = %spec.program, error = %e, "failed to start command");
                CommandOutput::not_run(String::new())
            }
        }
    }
}

/// Drain both pipes and wait for exit, leaving `child` in place so it can
/// still be killed.
async fn collect(child: &mut Child) -> io::Result<process::Output> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let (status, stdout, stderr) =
        tokio::try_join!(child.wait(), read_all(stdout), read_all(stderr))?;
    Ok(process::Output {
        status,
        stdout,
        stderr,
    })
}

async fn read_all<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Kill a timed-out child along with everything it started, then reap it.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id().and_then(|id| i32::try_from(id).ok()) {
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        // Spawned as the leader of its own process group.
        if let Err(e) = killpg(Pid::from_raw(pid), Signal::SIGKILL) {
            debug!(pid, error = %e, "failed to kill process group");
        }
    }
    if let Err(e) = child.kill().await {
        debug!(error = %e, "failed to kill timed-out command");
    }
}
