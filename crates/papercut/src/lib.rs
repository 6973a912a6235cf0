//! PaperCut NG/MF web services exposed as MCP tools.
//!
//! Every tool issues at most one authenticated XML-RPC call to the configured
//! PaperCut server and returns its result as a JSON text payload.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use papercut::{Config, build_registry};
//!
//! # async fn example() -> mcp::Result<()> {
//! let registry = build_registry(Arc::new(Config::load()));
//! mcp::Server::new(registry, papercut::SERVER_NAME, papercut::VERSION)
//!     .serve_stdio()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod error;
pub mod properties;
pub mod tools;

use std::sync::Arc;

use mcp::McpRegistry;

pub use client::Client;
pub use config::{CallConfig, Config};
pub use error::{Error, Result};
pub use properties::{DOC_URL, KnownProperty, UserProperty};
pub use tools::{ToolContext, register_all_tools};

/// Name announced to MCP hosts.
pub const SERVER_NAME: &str = "papercut-mcp";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// A registry holding every PaperCut tool, bound to `config`.
pub fn build_registry(config: Arc<Config>) -> McpRegistry {
    let mut registry = McpRegistry::new();
    register_all_tools(&mut registry, &ToolContext::new(config));
    registry
}
