//! REST API handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use tracing::{debug, warn};

use super::types::{run_command_tool, ListToolsResponse, RunCommandRequest, ToolResult};
use crate::execution::{CommandRunner, ExecutionRequest};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<CommandRunner>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_runner(CommandRunner::new())
    }

    pub fn with_runner(runner: CommandRunner) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Health check endpoint.
pub async fn health() -> &'static str {
    "OK"
}

/// API information endpoint.
pub async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "command-runner",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "instructions": format!("Run commands on this {} machine", std::env::consts::OS),
    }))
}

/// List the published tools.
pub async fn list_tools() -> Json<ListToolsResponse> {
    Json(ListToolsResponse {
        tools: vec![run_command_tool()],
    })
}

/// Invoke the `run_command` tool.
pub async fn run_command(
    State(state): State<AppState>,
    Json(req): Json<RunCommandRequest>,
) -> Json<ToolResult> {
    Json(handle_run_command(&state.runner, req).await)
}

/// Map a tool call onto the runner.
///
/// Every outcome is a [`ToolResult`]; infrastructure failures are folded
/// into an error result carrying the failure text.
pub async fn handle_run_command(runner: &CommandRunner, req: RunCommandRequest) -> ToolResult {
    debug!(?req, "ToolRequest");

    let command = match req.command.as_deref() {
        Some(command) if !command.is_empty() => command,
        other => {
            return ToolResult::error(format!(
                "Command is required, current value: {}",
                other.unwrap_or("null")
            ))
        }
    };

    let request =
        ExecutionRequest::from_parts(command, req.workdir.as_deref(), req.stdin.as_deref());

    match runner.run(&request).await {
        Ok(result) => ToolResult::from_execution(&result),
        Err(e) => {
            warn!("run_command failed: {}", e);
            ToolResult::error(e.to_string())
        }
    }
}
