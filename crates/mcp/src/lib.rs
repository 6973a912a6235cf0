//! MCP (Model Context Protocol) server library.
//!
//! Serves a registry of tools to an MCP host over newline-delimited stdio.
//!
//! # Example
//!
//! ```no_run
//! use mcp::{CallToolResult, McpRegistry, Server, ToolBuilder};
//!
//! # async fn example() -> mcp::Result<()> {
//! let mut registry = McpRegistry::new();
//! registry.register_tool(
//!     ToolBuilder::new("hello")
//!         .description("Say hello")
//!         .build(|_args| async { Ok(CallToolResult::text("hello")) }),
//! );
//!
//! Server::new(registry, "hello-server", "0.1.0").serve_stdio().await?;
//! # Ok(())
//! # }
//! ```

mod error;
mod protocol;
mod registry;
mod server;

pub use error::{Error, McpError, Result};
pub use protocol::{
    CallToolParams, CallToolResult, ClientInfo, InitializeParams, InitializeResult,
    JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, LATEST_PROTOCOL_VERSION,
    ListToolsResult, RequestId, SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ServerInfo,
    Tool, ToolContent, ToolsCapability, methods,
};
pub use registry::{
    McpRegistry, RegisteredTool, ToolBuilder, ToolFuture, ToolHandler, ToolResult,
    parse_arguments,
};
pub use server::{MAX_MESSAGE_SIZE, Server};
