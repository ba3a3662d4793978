//! command-runner binary entry point.

use std::process::ExitCode;

use command_runner::api::{self, AppState};
use command_runner::cli::{self, Args};
use command_runner::config::Config;
use command_runner::{logging, CommandRunner, ExecutionRequest};
use tokio::io::AsyncReadExt;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'command-runner --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    // Ignore a second init; the subscriber is already in place
    let _ = logging::init_with_filter(config.log_filter());

    // Built after logging so the runner picks up the global subscriber
    let runner = config.runner();

    match args.exec {
        Some(ref command) => run_once(&runner, command, &args).await,
        None => serve(&config, runner).await,
    }
}

async fn run_once(runner: &CommandRunner, command: &str, args: &Args) -> ExitCode {
    let mut request = ExecutionRequest::new(command);
    request.workdir = args.workdir.clone();

    if args.forward_stdin {
        let mut input = String::new();
        if let Err(e) = tokio::io::stdin().read_to_string(&mut input).await {
            error!("Failed to read stdin: {}", e);
            return ExitCode::from(2);
        }
        request.stdin = Some(input);
    }

    match runner.run(&request).await {
        Ok(result) => {
            match serde_json::to_string_pretty(&result) {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    error!("Failed to encode result: {}", e);
                    return ExitCode::from(2);
                }
            }
            if result.is_error() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("run_command failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::from(2)
        }
    }
}

async fn serve(config: &Config, runner: CommandRunner) -> ExitCode {
    let server_config = match config.to_server_config() {
        Ok(server_config) => server_config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };

    info!("command-runner v{}", env!("CARGO_PKG_VERSION"));
    info!(
        timeout_secs = runner.timeout().as_secs(),
        "Publishing tool: {}",
        api::RUN_COMMAND_TOOL
    );

    match api::serve_with_state(server_config, AppState::with_runner(runner)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
