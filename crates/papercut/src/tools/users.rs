//! User tools: properties, statistics, balances, accounts and groups.

use mcp::{McpError, McpRegistry, RegisteredTool, ToolBuilder, ToolResult, parse_arguments};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue, json};
use xmlrpc::Value;

use super::{
    PagingArgs, ToolContext, json_number, limit_schema, offset_schema, paging, respond,
    with_context,
};
use crate::config::coerce_number;
use crate::properties::{DOC_URL, KnownProperty, UserProperty};

pub const GET_USER_PROPERTY: &str = "papercut_get_user_property";
pub const GET_USER_PROPERTIES: &str = "papercut_get_user_properties";
pub const GET_USER_STATS_TOTAL: &str = "papercut_get_user_stats_total";
pub const GET_USER_ACCOUNT_BALANCE: &str = "papercut_get_user_account_balance";
pub const LIST_USER_ACCOUNTS: &str = "papercut_list_user_accounts";
pub const GET_USER_GROUPS: &str = "papercut_get_user_groups";

pub fn register_tools(registry: &mut McpRegistry, ctx: &ToolContext) {
    registry.register_tool(get_user_property_tool(ctx));
    registry.register_tool(get_user_properties_tool(ctx));
    registry.register_tool(get_user_stats_total_tool(ctx));
    registry.register_tool(get_user_account_balance_tool(ctx));
    registry.register_tool(list_user_accounts_tool(ctx));
    registry.register_tool(get_user_groups_tool(ctx));
}

fn username_schema() -> JsonValue {
    json!({ "type": "string", "description": "PaperCut username." })
}

fn property_schema() -> JsonValue {
    let names = KnownProperty::names();
    json!({
        "type": "string",
        "minLength": 1,
        "examples": names,
        "description": format!(
            "User property name. Documented names: {}. See {DOC_URL}",
            names.join(", ")
        )
    })
}

// ============================================================================
// papercut_get_user_property
// ============================================================================

#[derive(Debug, Deserialize)]
struct GetUserPropertyArgs {
    username: String,
    property: UserProperty,
}

fn get_user_property_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_USER_PROPERTY)
        .title("PaperCut Get User Property")
        .description("Gets a single user property via api.getUserProperty.")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "username": username_schema(),
                "property": property_schema()
            },
            "required": ["username", "property"]
        }))
        .build(with_context(ctx, get_user_property))
}

async fn get_user_property(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: GetUserPropertyArgs = parse_arguments(args)?;
    let params = vec![
        Value::from(args.username),
        Value::from(args.property.as_str()),
    ];
    let outcome = ctx
        .remote_call("api.getUserProperty", params)
        .await
        .map(|value| json!({ "value": value.to_json() }));
    respond(GET_USER_PROPERTY, outcome)
}

// ============================================================================
// papercut_get_user_properties
// ============================================================================

#[derive(Debug, Deserialize)]
struct GetUserPropertiesArgs {
    username: String,
    properties: Vec<UserProperty>,
}

fn get_user_properties_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_USER_PROPERTIES)
        .title("PaperCut Get User Properties")
        .description(
            "Gets several user properties in one call via api.getUserProperties. \
             Returns a map from property name to value in request order.",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "username": username_schema(),
                "properties": {
                    "type": "array",
                    "items": property_schema(),
                    "minItems": 1
                }
            },
            "required": ["username", "properties"]
        }))
        .build(with_context(ctx, get_user_properties))
}

async fn get_user_properties(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: GetUserPropertiesArgs = parse_arguments(args)?;
    if args.properties.is_empty() {
        return Err(McpError::InvalidParams(
            "properties must name at least one property".into(),
        ));
    }

    let names: Vec<Value> = args
        .properties
        .iter()
        .map(|p| Value::from(p.as_str()))
        .collect();
    let params = vec![Value::from(args.username), Value::Array(names)];

    let outcome = ctx
        .remote_call("api.getUserProperties", params)
        .await
        .map(|result| json!({ "values": zip_values(&args.properties, &result) }));
    respond(GET_USER_PROPERTIES, outcome)
}

/// Pair each requested name with the upstream value at the same index.
/// Missing entries are `null`.
fn zip_values(properties: &[UserProperty], result: &Value) -> Map<String, JsonValue> {
    let values = result.as_array().unwrap_or_default();
    properties
        .iter()
        .enumerate()
        .map(|(i, property)| {
            let value = values.get(i).map(Value::to_json).unwrap_or(JsonValue::Null);
            (property.as_str().to_string(), value)
        })
        .collect()
}

// ============================================================================
// papercut_get_user_stats_total
// ============================================================================

#[derive(Debug, Deserialize)]
struct UsernameArgs {
    username: String,
}

fn get_user_stats_total_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_USER_STATS_TOTAL)
        .title("PaperCut Get User Stats (Total)")
        .description("Gets a user's lifetime totals: printed pages and print jobs.")
        .input_schema(json!({
            "type": "object",
            "properties": { "username": username_schema() },
            "required": ["username"]
        }))
        .build(with_context(ctx, get_user_stats_total))
}

async fn get_user_stats_total(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: UsernameArgs = parse_arguments(args)?;
    let stats = vec![
        Value::from(KnownProperty::PrintStatsPageCount.as_str()),
        Value::from(KnownProperty::PrintStatsJobCount.as_str()),
    ];
    let params = vec![Value::from(args.username), Value::Array(stats)];

    let outcome = ctx
        .remote_call("api.getUserProperties", params)
        .await
        .map(|result| {
            let values = result.as_array().unwrap_or_default();
            json!({
                "pageCount": json_number(coerce_stat(values.first())),
                "jobCount": json_number(coerce_stat(values.get(1))),
            })
        });
    respond(GET_USER_STATS_TOTAL, outcome)
}

/// Read a counter as a finite, non-negative number; anything else is 0.
fn coerce_stat(value: Option<&Value>) -> f64 {
    let n = match value {
        Some(Value::String(text)) => coerce_number(text),
        Some(Value::Boolean(b)) => f64::from(u8::from(*b)),
        Some(other) => other.as_f64().unwrap_or(0.0),
        None => 0.0,
    };
    if n.is_finite() && n > 0.0 { n } else { 0.0 }
}

// ============================================================================
// papercut_get_user_account_balance
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetUserAccountBalanceArgs {
    username: String,
    #[serde(default)]
    account_name: Option<String>,
}

fn get_user_account_balance_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_USER_ACCOUNT_BALANCE)
        .title("PaperCut Get User Account Balance")
        .description(
            "Gets a user's account balance via api.getUserAccountBalance. \
             Uses the primary account unless accountName is given.",
        )
        .input_schema(json!({
            "type": "object",
            "properties": {
                "username": username_schema(),
                "accountName": {
                    "type": "string",
                    "description": "Optional. Defaults to primary if omitted."
                }
            },
            "required": ["username"]
        }))
        .build(with_context(ctx, get_user_account_balance))
}

async fn get_user_account_balance(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: GetUserAccountBalanceArgs = parse_arguments(args)?;
    let params = balance_params(args);
    let outcome = ctx
        .remote_call("api.getUserAccountBalance", params)
        .await
        .map(|balance| json!({ "balance": balance.to_json() }));
    respond(GET_USER_ACCOUNT_BALANCE, outcome)
}

/// An empty account name means the primary account.
fn balance_params(args: GetUserAccountBalanceArgs) -> Vec<Value> {
    let mut params = vec![Value::from(args.username)];
    if let Some(account) = args.account_name.filter(|a| !a.is_empty()) {
        params.push(Value::from(account));
    }
    params
}

// ============================================================================
// papercut_list_user_accounts
// ============================================================================

fn list_user_accounts_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(LIST_USER_ACCOUNTS)
        .title("PaperCut List User Accounts")
        .description("Lists user accounts (paged) via api.listUserAccounts(offset, limit).")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "offset": offset_schema(),
                "limit": limit_schema()
            },
            "required": ["offset", "limit"]
        }))
        .build(with_context(ctx, list_user_accounts))
}

async fn list_user_accounts(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: PagingArgs = parse_arguments(args)?;
    let (offset, limit) = paging(args.offset, args.limit)?;
    let outcome = ctx
        .remote_call("api.listUserAccounts", vec![offset.into(), limit.into()])
        .await
        .map(|users| json!({ "users": users.to_json() }));
    respond(LIST_USER_ACCOUNTS, outcome)
}

// ============================================================================
// papercut_get_user_groups
// ============================================================================

fn get_user_groups_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_USER_GROUPS)
        .title("PaperCut Get User Groups")
        .description("Lists the groups a user belongs to via api.getUserGroups.")
        .input_schema(json!({
            "type": "object",
            "properties": { "username": username_schema() },
            "required": ["username"]
        }))
        .build(with_context(ctx, get_user_groups))
}

async fn get_user_groups(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: UsernameArgs = parse_arguments(args)?;
    let outcome = ctx
        .remote_call("api.getUserGroups", vec![Value::from(args.username)])
        .await
        .map(|groups| json!({ "groups": groups.to_json() }));
    respond(GET_USER_GROUPS, outcome)
}
