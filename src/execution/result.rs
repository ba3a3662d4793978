//! Execution result types.

use std::time::Duration;

use serde::{Serialize, Serializer};

/// Outcome of a command that ran to completion.
///
/// Fields are private so the `is_error`/`message` pairing cannot be broken
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    stdout: String,
    stderr: String,
    is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    exit_code: i32,
    #[serde(rename = "durationMs", serialize_with = "as_millis")]
    duration: Duration,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl ExecutionResult {
    /// Assemble a result from an exit code and the raw captured streams.
    pub fn from_exit(
        exit_code: i32,
        stdout: impl AsRef<str>,
        stderr: impl AsRef<str>,
        duration: Duration,
    ) -> Self {
        let is_error = exit_code != 0;
        Self {
            stdout: stdout.as_ref().trim().to_string(),
            stderr: stderr.as_ref().trim().to_string(),
            is_error,
            message: is_error.then(|| format!("Command failed with exit code: {exit_code}")),
            exit_code,
            duration,
        }
    }

    /// Captured standard output, trimmed.
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Captured standard error, trimmed.
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// True iff the exit code was non-zero.
    pub fn is_error(&self) -> bool {
        self.is_error
    }

    /// Failure summary, present exactly when [`is_error`](Self::is_error) is true.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Process exit code.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Wall-clock time from spawn to result assembly.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self::from_exit(0, "", "", Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_success() {
        let result = ExecutionResult::from_exit(0, "hello\n", "", Duration::from_millis(5));
        assert!(!result.is_error());
        assert!(result.message().is_none());
        assert_eq!(result.stdout(), "hello");
        assert_eq!(result.stderr(), "");
        assert_eq!(result.duration(), Duration::from_millis(5));
    }

    #[test]
    fn test_result_failure_message() {
        let result = ExecutionResult::from_exit(2, "", "boom\n", Duration::ZERO);
        assert!(result.is_error());
        assert_eq!(result.exit_code(), 2);
        assert_eq!(result.message(), Some("Command failed with exit code: 2"));
        assert_eq!(result.stderr(), "boom");
    }

    #[test]
    fn test_negative_exit_code_is_error() {
        let result = ExecutionResult::from_exit(-1, "", "", Duration::ZERO);
        assert!(result.is_error());
        assert!(result.message().unwrap().contains("-1"));
    }

    #[test]
    fn test_trims_whitespace() {
        let result = ExecutionResult::from_exit(0, "  line1\nline2\n\n", "\t\n", Duration::ZERO);
        assert_eq!(result.stdout(), "line1\nline2");
        assert!(result.stderr().is_empty());
    }

    #[test]
    fn test_default_is_empty_success() {
        let result = ExecutionResult::default();
        assert!(!result.is_error());
        assert!(result.stdout().is_empty());
        assert!(result.stderr().is_empty());
    }

    #[test]
    fn test_serialization_shape() {
        let ok = ExecutionResult::from_exit(0, "out", "", Duration::from_millis(12));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["stdout"], "out");
        assert_eq!(json["isError"], false);
        assert_eq!(json["exitCode"], 0);
        assert_eq!(json["durationMs"], 12);
        assert!(json.get("message").is_none());

        let failed = ExecutionResult::from_exit(3, "", "err", Duration::ZERO);
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["message"], "Command failed with exit code: 3");
    }
}
