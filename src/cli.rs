//! Command-line interface for command-runner.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::net::IpAddr;
use std::path::PathBuf;

/// Command-line arguments.
///
/// Server and execution settings are optional so that unset flags leave
/// config file and environment values in place.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Host address to bind to.
    pub host: Option<IpAddr>,
    /// Port to listen on.
    pub port: Option<u16>,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Command timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Run this command once and exit instead of serving.
    pub exec: Option<String>,
    /// Working directory for `--exec`.
    pub workdir: Option<PathBuf>,
    /// Forward our own stdin to the `--exec` command.
    pub forward_stdin: bool,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('H') | Long("host") => {
                let value: String = parser.value()?.parse()?;
                result.host = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("host", value))?,
                );
            }
            Short('p') | Long("port") => {
                let value: String = parser.value()?.parse()?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidValue("port", value))?,
                );
            }
            Short('t') | Long("timeout") => {
                let value: String = parser.value()?.parse()?;
                match value.parse::<u64>() {
                    Ok(secs) if secs > 0 => result.timeout_secs = Some(secs),
                    _ => return Err(ArgsError::InvalidValue("timeout", value)),
                }
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("exec") => {
                let value: String = parser.value()?.parse()?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidValue("exec", value));
                }
                result.exec = Some(value);
            }
            Short('w') | Long("workdir") => {
                result.workdir = Some(parser.value()?.parse()?);
            }
            Long("stdin") => {
                result.forward_stdin = true;
            }
            Value(val) => {
                return Err(ArgsError::UnexpectedArgument(val.to_string_lossy().into()));
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if result.exec.is_none() && (result.workdir.is_some() || result.forward_stdin) {
        return Err(ArgsError::RequiresExec);
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"command-runner {version}
Run shell commands with captured output, stdin forwarding and a hard timeout

USAGE:
    command-runner [OPTIONS]
    command-runner [OPTIONS] --exec <COMMAND> [--workdir <DIR>] [--stdin]

OPTIONS:
    -H, --host <ADDR>       Host address to bind [default: 127.0.0.1]
    -p, --port <PORT>       Port to listen on [default: 3000]
    -c, --config <FILE>     Path to configuration file (JSON)
    -t, --timeout <SECS>    Per-command timeout [default: 60]
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
    -e, --exec <COMMAND>    Run one command, print the JSON result and exit
    -w, --workdir <DIR>     Working directory for --exec
        --stdin             Pipe this process's stdin into the --exec command
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    COMMAND_RUNNER_HOST           Host address (overrides config)
    COMMAND_RUNNER_PORT           Port number (overrides config)
    COMMAND_RUNNER_TIMEOUT_SECS   Per-command timeout (overrides config)
    COMMAND_RUNNER_LOG_LEVEL      Log level (overrides config)
    RUST_LOG                      Alternative log level setting

EXAMPLES:
    # Serve the run_command tool on localhost:3000
    command-runner

    # One-shot execution
    command-runner -e 'ls -la' -w /tmp

    # Feed a script through stdin
    echo 'print(2 + 2)' | command-runner -e python3 --stdin
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("command-runner {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
    /// `--workdir` or `--stdin` given without `--exec`.
    RequiresExec,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
            Self::RequiresExec => write!(f, "--workdir and --stdin require --exec"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
