//! PaperCut MCP tools.
//!
//! Each handler issues at most one remote call. Upstream failures are
//! reported as `{"error": message}` payloads; only invalid arguments are
//! raised to the host.

pub mod groups;
pub mod printers;
pub mod properties;
pub mod server;
pub mod users;

use std::future::Future;
use std::sync::Arc;

use mcp::{CallToolResult, McpError, McpRegistry, ToolResult};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::warn;
use xmlrpc::Value;

use crate::client::Client;
use crate::config::{CallConfig, Config};
use crate::error::Result;

/// State shared by every tool handler.
#[derive(Debug, Clone)]
pub struct ToolContext {
    config: Arc<Config>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Open a fresh client from the current configuration and issue one call.
    pub async fn remote_call(&self, method: &str, params: Vec<Value>) -> Result<Value> {
        let call = CallConfig::from_config(&self.config);
        let client = Client::open(&call)?;
        client.call(method, params).await
    }
}

/// Register all tools with the registry
pub fn register_all_tools(registry: &mut McpRegistry, ctx: &ToolContext) {
    server::register_tools(registry, ctx);
    users::register_tools(registry, ctx);
    printers::register_tools(registry, ctx);
    groups::register_tools(registry, ctx);
    properties::register_tools(registry);
}

/// Adapt a `(ctx, args)` handler to the registry's handler shape.
fn with_context<F, Fut>(
    ctx: &ToolContext,
    handler: F,
) -> impl Fn(JsonValue) -> Fut + Send + Sync + 'static
where
    F: Fn(ToolContext, JsonValue) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolResult> + Send + 'static,
{
    let ctx = ctx.clone();
    move |args| handler(ctx.clone(), args)
}

/// Wrap a handler outcome as a single JSON text block.
fn respond(tool: &str, outcome: Result<JsonValue>) -> ToolResult {
    let payload = match outcome {
        Ok(payload) => payload,
        Err(e) => {
            warn!(tool, error = %e, "tool call failed");
            json!({ "error": e.to_string() })
        }
    };
    json_result(&payload)
}

fn json_result(payload: &JsonValue) -> ToolResult {
    CallToolResult::json(payload).map_err(|e| McpError::InternalError(e.to_string()))
}

/// Arguments of the plain `(offset, limit)` listings.
///
/// Bounds are read as JSON numbers so that `2.0` counts as an integer.
#[derive(Debug, Deserialize)]
struct PagingArgs {
    offset: f64,
    limit: f64,
}

/// Checked paging window; both bounds must be whole numbers that fit an
/// XML-RPC `int`.
fn paging(offset: f64, limit: f64) -> std::result::Result<(i32, i32), McpError> {
    let max = i32::MAX;
    match (whole_in_range(offset, 0), whole_in_range(limit, 1)) {
        (Some(offset), Some(limit)) => Ok((offset, limit)),
        (None, _) => Err(McpError::InvalidParams(format!(
            "offset must be an integer between 0 and {max}, got {offset}"
        ))),
        (_, None) => Err(McpError::InvalidParams(format!(
            "limit must be an integer between 1 and {max}, got {limit}"
        ))),
    }
}

fn whole_in_range(n: f64, min: i32) -> Option<i32> {
    let whole = n.fract() == 0.0 && n >= f64::from(min) && n <= f64::from(i32::MAX);
    whole.then_some(n as i32)
}

/// JSON schema for a paging offset.
fn offset_schema() -> JsonValue {
    json!({
        "type": "integer",
        "minimum": 0,
        "maximum": i32::MAX,
        "description": "Starting index (0-based)."
    })
}

/// JSON schema for a paging limit.
fn limit_schema() -> JsonValue {
    json!({
        "type": "integer",
        "minimum": 1,
        "maximum": i32::MAX,
        "description": "Batch size (recommended up to 1000)."
    })
}

/// A JSON number, written as an integer when it has no fractional part.
fn json_number(n: f64) -> JsonValue {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        json!(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null)
    }
}
