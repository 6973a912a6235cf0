//! Group tools.

use mcp::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult, parse_arguments};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use xmlrpc::Value;

use super::{ToolContext, limit_schema, offset_schema, paging, respond, with_context};

pub const GET_GROUP_MEMBERS: &str = "papercut_get_group_members";

pub fn register_tools(registry: &mut McpRegistry, ctx: &ToolContext) {
    registry.register_tool(get_group_members_tool(ctx));
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetGroupMembersArgs {
    group_name: String,
    offset: f64,
    limit: f64,
}

fn get_group_members_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_GROUP_MEMBERS)
        .title("PaperCut Get Group Members")
        .description("Lists the members of a group (paged) via api.getGroupMembers.")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "groupName": { "type": "string", "description": "Group name." },
                "offset": offset_schema(),
                "limit": limit_schema()
            },
            "required": ["groupName", "offset", "limit"]
        }))
        .build(with_context(ctx, get_group_members))
}

async fn get_group_members(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: GetGroupMembersArgs = parse_arguments(args)?;
    let (offset, limit) = paging(args.offset, args.limit)?;
    let params = vec![Value::from(args.group_name), offset.into(), limit.into()];
    let outcome = ctx
        .remote_call("api.getGroupMembers", params)
        .await
        .map(|members| json!({ "members": members.to_json() }));
    respond(GET_GROUP_MEMBERS, outcome)
}
