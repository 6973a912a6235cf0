//! Documented user property listing. Answered locally.

use mcp::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult};
use serde_json::{Value as JsonValue, json};

use super::json_result;
use crate::properties::{DOC_URL, KnownProperty};

pub const LIST_USER_PROPERTIES: &str = "papercut_list_user_properties";

pub fn register_tools(registry: &mut McpRegistry) {
    registry.register_tool(list_user_properties_tool());
}

fn list_user_properties_tool() -> RegisteredTool {
    ToolBuilder::new(LIST_USER_PROPERTIES)
        .title("PaperCut List User Properties")
        .description(
            "Lists the documented user property names (local, no server call). \
             Other names are also accepted by the property tools.",
        )
        .build(list_user_properties)
}

async fn list_user_properties(_args: JsonValue) -> ToolResult {
    json_result(&json!({
        "properties": KnownProperty::names(),
        "doc": DOC_URL,
    }))
}
