//! Command execution engine.
//!
//! This module runs a command line through the platform shell:
//! - Stdin forwarding (or immediate close)
//! - Concurrent stdout/stderr draining
//! - Hard timeout with forced kill
//!
//! # Example
//!
//! ```no_run
//! use command_runner::execution::{execute, CommandRunner, ExecutionRequest};
//!
//! # async fn demo() -> command_runner::Result<()> {
//! // Simple one-shot execution
//! let result = execute("echo hello", None, None).await?;
//! println!("Output: {}", result.stdout());
//!
//! // Request with working directory and stdin
//! let request = ExecutionRequest::new("python3").workdir("/tmp").stdin("print(2 + 2)");
//! let result = CommandRunner::new().run(&request).await?;
//! assert!(!result.is_error());
//! # Ok(())
//! # }
//! ```

mod request;
mod result;
mod runner;
mod shell;
mod stream;

pub use request::ExecutionRequest;
pub use result::ExecutionResult;
pub use runner::{execute, execute_blocking, CommandRunner, DEFAULT_TIMEOUT, DRAIN_GRACE};
pub use shell::{fish_command, platform_shell, uses_fish, ShellInvocation, StdinPlan};
