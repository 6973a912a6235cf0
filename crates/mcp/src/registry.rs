//! Tool registry.
//!
//! Tools are kept in registration order so `tools/list` is stable.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::McpError;
use crate::protocol::{CallToolResult, Tool};

/// Result type for tool execution.
pub type ToolResult = Result<CallToolResult, McpError>;

/// Boxed future for async tool execution.
pub type ToolFuture = Pin<Box<dyn Future<Output = ToolResult> + Send>>;

/// Tool handler function type. Handlers capture whatever context they need.
pub type ToolHandler = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// A registered tool with metadata and handler.
pub struct RegisteredTool {
    pub name: String,
    pub title: Option<String>,
    pub description: String,
    pub input_schema: Value,
    pub handler: ToolHandler,
}

impl RegisteredTool {
    /// The definition advertised through `tools/list`.
    pub fn definition(&self) -> Tool {
        Tool {
            name: self.name.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.name)
            .field("title", &self.title)
            .finish_non_exhaustive()
    }
}

/// Registry for MCP tools.
#[derive(Debug, Default)]
pub struct McpRegistry {
    tools: Vec<RegisteredTool>,
}

impl McpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register_tool(&mut self, tool: RegisteredTool) {
        match self.tools.iter_mut().find(|t| t.name == tool.name) {
            Some(existing) => *existing = tool,
            None => self.tools.push(tool),
        }
    }

    /// Definitions of every registered tool.
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.iter().map(RegisteredTool::definition).collect()
    }

    pub fn get_tool(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }

    /// Run a tool. Missing or `null` arguments are passed as `{}`.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        let tool = self
            .get_tool(name)
            .ok_or_else(|| McpError::InvalidParams(format!("Unknown tool: {name}")))?;

        let arguments = match arguments {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(args) => args,
        };

        (tool.handler)(arguments).await
    }
}

/// Builder for creating tools.
pub struct ToolBuilder {
    name: String,
    title: Option<String>,
    description: String,
    input_schema: Value,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            description: String::new(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn input_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    pub fn build<F, Fut>(self, handler: F) -> RegisteredTool
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        RegisteredTool {
            name: self.name,
            title: self.title,
            description: self.description,
            input_schema: self.input_schema,
            handler: Arc::new(move |args| Box::pin(handler(args))),
        }
    }
}

/// Deserialize tool arguments, mapping failures to `InvalidParams`.
pub fn parse_arguments<T: DeserializeOwned>(arguments: Value) -> Result<T, McpError> {
    serde_json::from_value(arguments).map_err(|e| McpError::InvalidParams(e.to_string()))
}
