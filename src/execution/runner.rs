//! Command execution engine.

use std::io;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;
use tracing::instrument::WithSubscriber;
use tracing::{debug, trace, warn, Dispatch};

use super::request::ExecutionRequest;
use super::result::ExecutionResult;
use super::shell::{ShellInvocation, StdinPlan};
use super::stream::StreamDrain;
use crate::error::CommandRunnerError;
use crate::Result;

/// Wall-clock bound on a single command.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How long each output drain may keep flushing after the child exits.
pub const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Runs shell commands to completion.
///
/// The runner holds no per-call state; clones are cheap and calls on the
/// same runner are fully independent.
#[derive(Clone)]
pub struct CommandRunner {
    timeout: Duration,
    drain_grace: Duration,
    dispatch: Dispatch,
}

impl CommandRunner {
    /// Create a runner that logs through the subscriber current at
    /// construction time.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            drain_grace: DRAIN_GRACE,
            dispatch: tracing::dispatcher::get_default(|d| d.clone()),
        }
    }

    /// Route this runner's diagnostics to `dispatch`.
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Override the execution timeout for every call on this runner.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the post-exit drain grace period.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Execution timeout applied to each call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Post-exit drain grace period.
    pub fn drain_grace(&self) -> Duration {
        self.drain_grace
    }

    /// Run a command and wait for it to finish.
    ///
    /// A non-zero exit is an `Ok` result with `is_error() == true`. Spawn
    /// failures and timeouts are returned as errors; on timeout the child
    /// has already been killed.
    pub async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.run_inner(request)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn run_inner(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        if request.command.trim().is_empty() {
            return Err(CommandRunnerError::InvalidRequest(
                "command must not be empty".into(),
            ));
        }

        debug!(
            command = %request.command,
            workdir = ?request.workdir,
            stdin = if request.stdin.is_some() { "provided" } else { "none" },
            "Executing command"
        );

        let start = Instant::now();
        let invocation = ShellInvocation::for_request(request);
        let workdir = request.effective_workdir();

        if let Some(dir) = workdir {
            if !dir.is_dir() {
                return Err(CommandRunnerError::spawn(
                    &request.command,
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("working directory does not exist: {}", dir.display()),
                    ),
                ));
            }
        }

        let mut child = invocation
            .to_command(workdir)
            .spawn()
            .map_err(|e| CommandRunnerError::spawn(&request.command, e))?;
        let pid = child.id().unwrap_or_default();
        debug!(pid, shell = invocation.program, "Spawned child process");

        // Drains start before stdin is fed so a chatty child can't fill a pipe
        // while we are blocked writing to it.
        let stdout = child.stdout.take().ok_or_else(|| missing_pipe("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing_pipe("stderr"))?;
        let stdout_drain = StreamDrain::spawn("stdout", stdout, &self.dispatch);
        let stderr_drain = StreamDrain::spawn("stderr", stderr, &self.dispatch);

        let pending_stdin = match (&invocation.stdin, child.stdin.take()) {
            (StdinPlan::Feed(input), Some(pipe)) => Some((pipe, input.as_str())),
            (_, pipe) => {
                // Dropping the pipe closes the child's input.
                drop(pipe);
                None
            }
        };

        // Feed and wait run concurrently. Once the child exits, an unfinished
        // write is abandoned even if a grandchild still holds the pipe.
        let mut feeding = pending_stdin.is_some();
        let mut feed = Box::pin(async move {
            if let Some((pipe, input)) = pending_stdin {
                if let Err(e) = feed_stdin(pipe, input).await {
                    debug!(
                        pid,
                        "Failed to write stdin to process (process may have already exited): {}",
                        e
                    );
                }
            }
        });

        let completion = tokio::time::timeout(self.timeout, async {
            loop {
                tokio::select! {
                    status = child.wait() => {
                        if feeding {
                            debug!(pid, "Failed to write stdin before process exited, abandoning write");
                        }
                        break status;
                    }
                    () = &mut feed, if feeding => feeding = false,
                }
            }
        })
        .await;
        drop(feed);

        let status = match completion {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                stdout_drain.abort();
                stderr_drain.abort();
                return Err(CommandRunnerError::Io(e));
            }
            Err(_) => {
                warn!(
                    pid,
                    "Command timed out after {} seconds, killing process",
                    self.timeout.as_secs()
                );
                if let Err(e) = child.kill().await {
                    warn!(pid, "Failed to kill timed out process: {}", e);
                }
                stdout_drain.abort();
                stderr_drain.abort();
                return Err(CommandRunnerError::Timeout(self.timeout));
            }
        };

        let stdout = stdout_drain.collect(self.drain_grace).await;
        let stderr = stderr_drain.collect(self.drain_grace).await;

        let exit_code = exit_code(status);
        let result = ExecutionResult::from_exit(exit_code, stdout, stderr, start.elapsed());
        debug!(
            pid,
            exit_code,
            duration_ms = result.duration().as_millis() as u64,
            "Command finished"
        );

        Ok(result)
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRunner")
            .field("timeout", &self.timeout)
            .field("drain_grace", &self.drain_grace)
            .finish_non_exhaustive()
    }
}

/// Write the whole payload, flush and close the pipe.
///
/// The error is returned rather than raised so the caller decides that a
/// child which stopped reading is not fatal.
async fn feed_stdin(mut pipe: ChildStdin, input: &str) -> io::Result<()> {
    trace!("Writing {} bytes to stdin", input.len());
    pipe.write_all(input.as_bytes()).await?;
    pipe.flush().await?;
    drop(pipe);
    Ok(())
}

fn missing_pipe(name: &str) -> CommandRunnerError {
    CommandRunnerError::Io(io::Error::other(format!("child {name} was not piped")))
}

/// Exit code, with signal deaths reported shell-style as `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}

/// One-shot execution with the default runner.
pub async fn execute(
    command: &str,
    workdir: Option<&str>,
    stdin: Option<&str>,
) -> Result<ExecutionResult> {
    CommandRunner::new()
        .run(&ExecutionRequest::from_parts(command, workdir, stdin))
        .await
}

/// Blocking one-shot execution on a private current-thread runtime.
///
/// Returns [`CommandRunnerError::InvalidRequest`] when called from inside a
/// tokio runtime, where blocking on a nested runtime would panic.
pub fn execute_blocking(
    command: &str,
    workdir: Option<&str>,
    stdin: Option<&str>,
) -> Result<ExecutionResult> {
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(CommandRunnerError::InvalidRequest(
            "execute_blocking cannot run inside an async runtime, use execute instead".into(),
        ));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(execute(command, workdir, stdin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_defaults() {
        let runner = CommandRunner::new();
        assert_eq!(runner.timeout(), Duration::from_secs(60));
        assert_eq!(runner.drain_grace(), Duration::from_secs(1));
    }

    #[test]
    fn test_runner_overrides() {
        let runner = CommandRunner::default()
            .with_timeout(Duration::from_secs(5))
            .with_drain_grace(Duration::from_millis(200));
        assert_eq!(runner.timeout(), Duration::from_secs(5));
        assert_eq!(runner.drain_grace(), Duration::from_millis(200));
        assert!(format!("{runner:?}").contains("CommandRunner"));
    }

    #[tokio::test]
    async fn test_empty_command_rejected() {
        let err = CommandRunner::new()
            .run(&ExecutionRequest::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandRunnerError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_execute_blocking_inside_runtime_is_rejected() {
        let err = execute_blocking("echo nested", None, None).unwrap_err();
        assert!(matches!(err, CommandRunnerError::InvalidRequest(_)));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::fmt;
        use std::sync::{Arc, Mutex};

        use tokio_test::{assert_err, assert_ok};
        use tracing::field::{Field, Visit};
        use tracing::{Event, Subscriber};
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

        #[derive(Debug, Clone, Default)]
        struct Captured {
            message: String,
            pid: Option<u64>,
        }

        impl Visit for Captured {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                if field.name() == "message" {
                    self.message = format!("{value:?}");
                }
            }

            fn record_u64(&mut self, field: &Field, value: u64) {
                if field.name() == "pid" {
                    self.pid = Some(value);
                }
            }
        }

        #[derive(Clone, Default)]
        struct CaptureLayer(Arc<Mutex<Vec<Captured>>>);

        impl CaptureLayer {
            fn events(&self) -> Vec<Captured> {
                self.0.lock().unwrap().clone()
            }

            fn contains(&self, needle: &str) -> bool {
                self.events().iter().any(|e| e.message.contains(needle))
            }

            fn spawned_pid(&self) -> Option<u64> {
                self.events()
                    .into_iter()
                    .find(|e| e.message == "Spawned child process")
                    .and_then(|e| e.pid)
            }
        }

        impl<S: Subscriber> Layer<S> for CaptureLayer {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                let mut captured = Captured::default();
                event.record(&mut captured);
                self.0.lock().unwrap().push(captured);
            }
        }

        fn capturing_runner() -> (CommandRunner, CaptureLayer) {
            let layer = CaptureLayer::default();
            let dispatch = Dispatch::new(tracing_subscriber::registry().with(layer.clone()));
            (CommandRunner::new().with_dispatch(dispatch), layer)
        }

        #[tokio::test]
        async fn test_injected_dispatch_receives_events() {
            let (runner, events) = capturing_runner();
            let result = assert_ok!(runner.run(&ExecutionRequest::new("echo hi")).await);
            assert_eq!(result.stdout(), "hi");

            assert!(events.contains("Executing command"));
            assert!(events.contains("Command finished"));
            assert!(events.spawned_pid().is_some());
        }

        #[tokio::test]
        async fn test_timeout_kills_process() {
            let (runner, events) = capturing_runner();
            let runner = runner.with_timeout(Duration::from_secs(1));

            let started = Instant::now();
            let err = assert_err!(runner.run(&ExecutionRequest::new("sleep 30")).await);
            assert!(err.is_timeout());
            assert!(started.elapsed() < Duration::from_secs(10));
            assert!(events.contains("timed out"));

            let pid = events.spawned_pid().expect("pid logged") as libc::pid_t;
            // The child was killed and reaped, so the pid no longer exists.
            let alive = unsafe { libc::kill(pid, 0) } == 0;
            assert!(!alive, "process {pid} still running after timeout");
        }

        #[tokio::test]
        async fn test_stdin_write_failure_is_not_fatal() {
            let (runner, events) = capturing_runner();
            let payload = "x".repeat(1024 * 1024);

            let result =
                assert_ok!(runner.run(&ExecutionRequest::new("exit 0").stdin(payload)).await);
            assert!(!result.is_error());
            assert!(events.contains("Failed to write stdin"));
        }

        #[tokio::test]
        async fn test_exit_with_unread_stdin_held_open_is_not_timeout() {
            let (runner, events) = capturing_runner();
            let runner = runner.with_timeout(Duration::from_secs(3));

            // The background sleep keeps the stdin pipe open but never reads
            // it, so the 1 MiB write can never complete.
            let request = ExecutionRequest::new(
                "exec 3<&0; sleep 10 <&3 >/dev/null 2>&1 & echo done",
            )
            .stdin("x".repeat(1 << 20));

            let started = Instant::now();
            let result = assert_ok!(runner.run(&request).await);
            assert!(started.elapsed() < Duration::from_secs(3));
            assert!(!result.is_error());
            assert_eq!(result.stdout(), "done");
            assert!(events.contains("abandoning write"));
        }

        #[tokio::test]
        async fn test_fish_path_never_writes_stdin() {
            let (runner, events) = capturing_runner();

            // Whether or not fish is installed, /bin/sh runs the rewrite.
            let result = runner
                .run(&ExecutionRequest::new("fish").stdin("echo from-fish"))
                .await;
            assert!(result.is_ok());
            assert!(!events.contains("bytes to stdin"));
            assert!(events.contains("Spawned child process"));
        }

        #[tokio::test]
        async fn test_normal_path_writes_stdin() {
            let (runner, events) = capturing_runner();
            let result = assert_ok!(runner.run(&ExecutionRequest::new("cat").stdin("abc")).await);
            assert_eq!(result.stdout(), "abc");
            assert!(events.contains("Writing 3 bytes to stdin"));
        }

        #[tokio::test]
        async fn test_signal_exit_code() {
            let result = assert_ok!(
                CommandRunner::new()
                    .run(&ExecutionRequest::new("kill -9 $$"))
                    .await
            );
            assert!(result.is_error());
            assert_eq!(result.exit_code(), 128 + 9);
        }

        #[tokio::test]
        async fn test_background_holder_hits_grace() {
            let runner = CommandRunner::new().with_drain_grace(Duration::from_millis(200));
            let started = Instant::now();

            // The backgrounded sleep inherits stdout and keeps the pipe open.
            let result = assert_ok!(
                runner
                    .run(&ExecutionRequest::new("echo before; sleep 5 & echo after"))
                    .await
            );
            assert!(result.stdout().contains("before"));
            assert!(result.stdout().contains("after"));
            assert!(started.elapsed() < Duration::from_secs(4));
        }
    }
}
