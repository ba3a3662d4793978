//! Error types for command-runner.

use std::time::Duration;

use thiserror::Error;

/// Main error type for command-runner operations.
///
/// Only infrastructure failures live here. A command that runs and exits
/// non-zero is reported through [`ExecutionResult`](crate::ExecutionResult).
#[derive(Error, Debug)]
pub enum CommandRunnerError {
    /// The shell could not be started.
    #[error("failed to start command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The child did not exit within the bound and was killed.
    #[error("Command timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The request was rejected before anything was spawned.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommandRunnerError {
    /// Wrap a spawn-time I/O error with the command that failed.
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    /// Whether this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Convenience Result type for command-runner operations.
pub type Result<T> = std::result::Result<T, CommandRunnerError>;
