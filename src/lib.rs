//! # command-runner
//!
//! Run shell commands for tool-calling agents.
//!
//! A command line is handed whole to the platform shell (`/bin/sh -c` or
//! `cmd.exe /c`), optional text is piped into its stdin, stdout and stderr
//! are drained concurrently, and a hard timeout kills anything that runs
//! too long.
//!
//! ## Features
//!
//! - **Shell delegation**: quoting, globbing and pipelines are the shell's job
//! - **Two failure channels**: non-zero exits are data, spawn failures and
//!   timeouts are errors
//! - **fish support**: stdin for `fish` is inlined as a base64 literal
//! - **Tool API**: the `run_command` tool served over HTTP
//!
//! ## Quick Start
//!
//! ```no_run
//! use command_runner::{CommandRunner, ExecutionRequest};
//!
//! #[tokio::main]
//! async fn main() -> command_runner::Result<()> {
//!     command_runner::logging::try_init().ok();
//!
//!     let runner = CommandRunner::new();
//!     let result = runner
//!         .run(&ExecutionRequest::new("wc -l").stdin("a\nb\n"))
//!         .await?;
//!
//!     if result.is_error() {
//!         eprintln!("{}", result.message().unwrap_or_default());
//!     }
//!     println!("{}", result.stdout());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;

// Re-export commonly used types
pub use error::{CommandRunnerError, Result};
pub use execution::{
    execute, execute_blocking, CommandRunner, ExecutionRequest, ExecutionResult, DEFAULT_TIMEOUT,
};
