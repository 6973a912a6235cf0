//! CLI error types.

use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The `--args` value is not a JSON document.
    #[error("invalid --args JSON: {0}")]
    InvalidArguments(serde_json::Error),

    /// The tool rejected the call before running it.
    #[error(transparent)]
    Tool(#[from] mcp::McpError),

    /// The stdio server stopped on an error.
    #[error(transparent)]
    Server(#[from] mcp::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
