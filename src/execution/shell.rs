//! Shell selection and invocation building.
//!
//! Command lines are never split into argv here; they are passed whole to
//! the platform shell, which owns quoting, globbing and pipelines.

use std::path::Path;
use std::process::Stdio;

use base64::{engine::general_purpose, Engine as _};
use tokio::process::Command;

use super::request::ExecutionRequest;

/// POSIX shell, also used as the intermediary for the fish workaround.
pub const POSIX_SHELL: &str = "/bin/sh";

/// Shell binary and its "run this string" flag for the current platform.
pub fn platform_shell() -> (&'static str, &'static str) {
    if cfg!(windows) {
        ("cmd.exe", "/c")
    } else {
        (POSIX_SHELL, "-c")
    }
}

/// What happens to the child's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StdinPlan {
    /// Write the text, flush, close.
    Feed(String),
    /// Close the write side right after spawn.
    Close,
    /// Payload travels inside the command line; stdin is the null device.
    Inline,
}

/// A fully resolved shell invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    /// Shell binary.
    pub program: &'static str,
    /// Arguments: the flag followed by the command line.
    pub args: [String; 2],
    /// Stdin handling for this invocation.
    pub stdin: StdinPlan,
}

impl ShellInvocation {
    /// Resolve the invocation for a request.
    pub fn for_request(request: &ExecutionRequest) -> Self {
        match request.stdin.as_deref() {
            Some(input) if uses_fish(request) => Self {
                program: POSIX_SHELL,
                args: ["-c".to_string(), fish_command(&request.command, input)],
                stdin: StdinPlan::Inline,
            },
            stdin => {
                let (program, flag) = platform_shell();
                Self {
                    program,
                    args: [flag.to_string(), request.command.clone()],
                    stdin: match stdin {
                        Some(input) => StdinPlan::Feed(input.to_string()),
                        None => StdinPlan::Close,
                    },
                }
            }
        }
    }

    /// The command line the shell will interpret.
    pub fn script(&self) -> &str {
        &self.args[1]
    }

    /// Build the process command with piped output streams.
    pub fn to_command(&self, workdir: Option<&Path>) -> Command {
        let mut cmd = Command::new(self.program);
        cmd.args(&self.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match self.stdin {
            StdinPlan::Inline => cmd.stdin(Stdio::null()),
            StdinPlan::Feed(_) | StdinPlan::Close => cmd.stdin(Stdio::piped()),
        };

        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }

        cmd
    }
}

/// Whether the command's first token is exactly `fish`.
pub fn uses_fish(request: &ExecutionRequest) -> bool {
    request.program() == Some("fish")
}

/// Rewrite a fish command so its stdin arrives as a base64 literal.
///
/// fish does not read piped input reliably, so the payload is decoded by
/// `base64 -d` and piped into a nested fish instead.
pub fn fish_command(command: &str, stdin: &str) -> String {
    let encoded = general_purpose::STANDARD.encode(stdin.as_bytes());
    format!("{command} -c \"echo {encoded} | base64 -d | fish\"")
}
