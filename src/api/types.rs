//! Tool request and response types.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::execution::ExecutionResult;

/// Name under which the command tool is published.
pub const RUN_COMMAND_TOOL: &str = "run_command";

/// Arguments of a `run_command` call.
///
/// `command` is optional at the wire level so a missing value can be
/// answered with a tool error instead of a rejected request.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunCommandRequest {
    /// Command line with arguments.
    #[serde(default)]
    pub command: Option<String>,
    /// Optional working directory.
    #[serde(default)]
    pub workdir: Option<String>,
    /// Optional text piped into the command's stdin.
    #[serde(default)]
    pub stdin: Option<String>,
}

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text { text: String },
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// Result of a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<Content>,
    pub is_error: bool,
}

impl ToolResult {
    /// A failed call carrying a single message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![Content::text(message)],
            is_error: true,
        }
    }

    /// Message, stdout and stderr, in that order, skipping empty parts.
    pub fn from_execution(result: &ExecutionResult) -> Self {
        let mut content = Vec::with_capacity(3);
        if let Some(message) = result.message() {
            content.push(Content::text(message));
        }
        if !result.stdout().is_empty() {
            content.push(Content::text(result.stdout()));
        }
        if !result.stderr().is_empty() {
            content.push(Content::text(result.stderr()));
        }
        Self {
            content,
            is_error: result.is_error(),
        }
    }
}

/// Published description of a tool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Describe the `run_command` tool for this machine.
pub fn run_command_tool() -> ToolDescriptor {
    ToolDescriptor {
        name: RUN_COMMAND_TOOL.to_string(),
        description: format!("Run a command on this {} machine", std::env::consts::OS),
        input_schema: json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Command with args"
                },
                "workdir": {
                    "type": "string",
                    "description": "Optional, current working directory"
                },
                "stdin": {
                    "type": "string",
                    "description": "Optional, text to pipe into the command's STDIN. For example, pass a python script to python3. Or, pass text for a new file to the cat command to create it!"
                }
            },
            "required": ["command"],
            "additionalProperties": false
        }),
    }
}

/// Tool listing response.
#[derive(Debug, Clone, Serialize)]
pub struct ListToolsResponse {
    pub tools: Vec<ToolDescriptor>,
}
