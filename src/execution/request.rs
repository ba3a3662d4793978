//! Execution request building and representation.

use std::path::{Path, PathBuf};

/// A single command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// The command line, handed to the platform shell untouched.
    pub command: String,
    /// Working directory override. `None` or empty inherits the caller's.
    pub workdir: Option<PathBuf>,
    /// Text for the child's stdin. `None` closes stdin immediately.
    pub stdin: Option<String>,
}

impl ExecutionRequest {
    /// Create a new request for the given command line.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            workdir: None,
            stdin: None,
        }
    }

    /// Set the working directory.
    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    /// Set the text piped into the child's stdin.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Build a request from loosely typed optional parts.
    pub fn from_parts(command: &str, workdir: Option<&str>, stdin: Option<&str>) -> Self {
        Self {
            command: command.to_string(),
            workdir: workdir.map(PathBuf::from),
            stdin: stdin.map(str::to_string),
        }
    }

    /// The working directory to apply, ignoring empty paths.
    pub fn effective_workdir(&self) -> Option<&Path> {
        self.workdir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }

    /// First whitespace-delimited token of the command line.
    pub fn program(&self) -> Option<&str> {
        self.command.split_whitespace().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_new() {
        let req = ExecutionRequest::new("ls -la");
        assert_eq!(req.command, "ls -la");
        assert!(req.workdir.is_none());
        assert!(req.stdin.is_none());
    }

    #[test]
    fn test_request_builder_chain() {
        let req = ExecutionRequest::new("cat").workdir("/tmp").stdin("hello");
        assert_eq!(req.workdir, Some(PathBuf::from("/tmp")));
        assert_eq!(req.stdin.as_deref(), Some("hello"));
    }

    #[test]
    fn test_empty_workdir_is_inherited() {
        let req = ExecutionRequest::new("pwd").workdir("");
        assert!(req.effective_workdir().is_none());

        let req = ExecutionRequest::new("pwd").workdir("/tmp");
        assert_eq!(req.effective_workdir(), Some(Path::new("/tmp")));
    }

    #[test]
    fn test_from_parts() {
        let req = ExecutionRequest::from_parts("echo hi", Some("/var"), None);
        assert_eq!(req.command, "echo hi");
        assert_eq!(req.workdir, Some(PathBuf::from("/var")));
        assert!(req.stdin.is_none());

        let req = ExecutionRequest::from_parts("cat", None, Some(""));
        assert_eq!(req.stdin.as_deref(), Some(""));
    }

    #[test]
    fn test_program_token() {
        assert_eq!(ExecutionRequest::new("fish -n").program(), Some("fish"));
        assert_eq!(ExecutionRequest::new("  python3\t-q").program(), Some("python3"));
        assert_eq!(ExecutionRequest::new("   ").program(), None);
    }
}
