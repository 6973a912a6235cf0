//! Server-level tools: user count and connectivity check.

use mcp::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};
use serde_json::{Value as JsonValue, json};
use tracing::warn;

use super::{ToolContext, json_result, respond, with_context};

pub const GET_TOTAL_USERS: &str = "papercut_get_total_users";
pub const PING: &str = "papercut_ping";

const TOTAL_USERS_METHOD: &str = "api.getTotalUsers";

pub fn register_tools(registry: &mut McpRegistry, ctx: &ToolContext) {
    registry.register_tool(get_total_users_tool(ctx));
    registry.register_tool(ping_tool(ctx));
}

fn get_total_users_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_TOTAL_USERS)
        .title("PaperCut Get Total Users")
        .description("Returns the total number of users via api.getTotalUsers.")
        .build(with_context(ctx, get_total_users))
}

async fn get_total_users(ctx: ToolContext, _args: JsonValue) -> ToolResult {
    let outcome = ctx
        .remote_call(TOTAL_USERS_METHOD, Vec::new())
        .await
        .map(|total| json!({ "totalUsers": total.to_json() }));
    respond(GET_TOTAL_USERS, outcome)
}

fn ping_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(PING)
        .title("PaperCut Ping")
        .description(
            "Checks connectivity and authentication against the PaperCut server \
             by calling api.getTotalUsers. Reports ok=true with the user count, \
             or ok=false with the error.",
        )
        .build(with_context(ctx, ping))
}

async fn ping(ctx: ToolContext, _args: JsonValue) -> ToolResult {
    let payload = match ctx.remote_call(TOTAL_USERS_METHOD, Vec::new()).await {
        Ok(total) => json!({ "ok": true, "totalUsers": total.to_json() }),
        Err(e) => {
            warn!(tool = PING, error = %e, "PaperCut server unreachable");
            json!({ "ok": false, "error": e.to_string() })
        }
    };
    json_result(&payload)
}
