//! API layer for command-runner.
//!
//! Publishes the `run_command` tool over HTTP.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/v1` - API information
//! - `GET /api/v1/tools` - Tool descriptors with input schemas
//! - `POST /api/v1/tools/run_command` - Run a command
//!
//! ## Example
//!
//! ```no_run
//! use command_runner::api::{ServerConfig, serve};
//!
//! #[tokio::main]
//! async fn main() -> command_runner::Result<()> {
//!     let config = ServerConfig::new("127.0.0.1", 3000);
//!     serve(config).await
//! }
//! ```

pub mod handlers;
pub mod router;
pub mod types;

// Re-export commonly used types
pub use handlers::{handle_run_command, AppState};
pub use router::{create_router, create_router_with_state, serve, serve_with_state, ServerConfig};
pub use types::{
    run_command_tool, Content, ListToolsResponse, RunCommandRequest, ToolDescriptor, ToolResult,
    RUN_COMMAND_TOOL,
};
