//! Printer tools.

use mcp::{McpRegistry, RegisteredTool, ToolBuilder, ToolResult, parse_arguments};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use xmlrpc::Value;

use super::{PagingArgs, ToolContext, limit_schema, offset_schema, paging, respond, with_context};

pub const LIST_PRINTERS: &str = "papercut_list_printers";
pub const GET_PRINTER_PROPERTY: &str = "papercut_get_printer_property";

pub fn register_tools(registry: &mut McpRegistry, ctx: &ToolContext) {
    registry.register_tool(list_printers_tool(ctx));
    registry.register_tool(get_printer_property_tool(ctx));
}

fn list_printers_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(LIST_PRINTERS)
        .title("PaperCut List Printers")
        .description("List printers (paged) via api.listPrinters(offset, limit).")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "offset": offset_schema(),
                "limit": limit_schema()
            },
            "required": ["offset", "limit"]
        }))
        .build(with_context(ctx, list_printers))
}

async fn list_printers(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: PagingArgs = parse_arguments(args)?;
    let (offset, limit) = paging(args.offset, args.limit)?;
    let outcome = ctx
        .remote_call("api.listPrinters", vec![offset.into(), limit.into()])
        .await
        .map(|printers| json!({ "printers": printers.to_json() }));
    respond(LIST_PRINTERS, outcome)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetPrinterPropertyArgs {
    server_name: String,
    printer_name: String,
    property: String,
}

fn get_printer_property_tool(ctx: &ToolContext) -> RegisteredTool {
    ToolBuilder::new(GET_PRINTER_PROPERTY)
        .title("PaperCut Get Printer Property")
        .description("Gets a printer property via api.getPrinterProperty.")
        .input_schema(json!({
            "type": "object",
            "properties": {
                "serverName": {
                    "type": "string",
                    "description": "Name of the print server hosting the printer."
                },
                "printerName": { "type": "string", "description": "Printer name." },
                "property": {
                    "type": "string",
                    "description": "Printer property name, e.g. disabled, print-stats.job-count."
                }
            },
            "required": ["serverName", "printerName", "property"]
        }))
        .build(with_context(ctx, get_printer_property))
}

async fn get_printer_property(ctx: ToolContext, args: JsonValue) -> ToolResult {
    let args: GetPrinterPropertyArgs = parse_arguments(args)?;
    let params = vec![
        Value::from(args.server_name),
        Value::from(args.printer_name),
        Value::from(args.property),
    ];
    let outcome = ctx
        .remote_call("api.getPrinterProperty", params)
        .await
        .map(|value| json!({ "value": value.to_json() }));
    respond(GET_PRINTER_PROPERTY, outcome)
}
