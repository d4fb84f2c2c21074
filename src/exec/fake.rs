//! Scripted command runner (testing only).
//!
//! Responses are keyed by the full command line, `program arg1 arg2 ...`.
//! Anything unscripted behaves like a program that isn't installed.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandOutput, CommandRunner, CommandSpec, NOT_RUN};

enum Reply {
    Output(CommandOutput),
    Panic(String),
}

#[derive(Default)]
pub struct ScriptedRunner {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply to `line` with `stdout` and exit code 0.
    #[must_use]
    pub fn on(self, line: &str, stdout: &str) -> Self {
        self.on_output(
            line,
            CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
                exit_code: 0,
            },
        )
    }

    #[must_use]
    pub fn on_output(mut self, line: &str, output: CommandOutput) -> Self {
        self.replies.insert(line.to_string(), Reply::Output(output));
        self
    }

    /// Panic with `message` when `line` runs.
    #[must_use]
    pub fn panic_on(mut self, line: &str, message: &str) -> Self {
        self.replies
            .insert(line.to_string(), Reply::Panic(message.to_string()));
        self
    }

    /// Every command run so far, in order.
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn command_line(spec: &CommandSpec) -> String {
    std::iter::once(spec.program.as_str())
        .chain(spec.args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

impl ScriptedRunner {
    fn reply(&self, spec: &CommandSpec) -> CommandOutput {
        self.calls.lock().unwrap().push(spec.clone());
        match self.replies.get(&command_line(spec)) {
            Some(Reply::Output(output)) => output.clone(),
            Some(Reply::Panic(message)) => panic!("{message}"),
            None => CommandOutput {
                exit_code: NOT_RUN,
                ..CommandOutput::default()
            },
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> CommandOutput {
        self.reply(spec)
    }

    fn run_blocking(&self, spec: &CommandSpec) -> CommandOutput {
        self.reply(spec)
    }
}
