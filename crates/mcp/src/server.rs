//! MCP server over newline-delimited stdio.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::{McpError, Result};
use crate::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JSONRPC_VERSION, JsonRpcRequest,
    JsonRpcResponse, LATEST_PROTOCOL_VERSION, ListToolsResult, RequestId,
    SUPPORTED_PROTOCOL_VERSIONS, ServerCapabilities, ServerInfo, ToolsCapability, methods,
};
use crate::registry::McpRegistry;

/// Maximum size of a single incoming message (1MB).
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// An MCP server answering requests from a registry of tools.
#[derive(Clone)]
pub struct Server {
    registry: Arc<McpRegistry>,
    info: ServerInfo,
}

impl Server {
    pub fn new(registry: McpRegistry, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            registry: Arc::new(registry),
            info: ServerInfo {
                name: name.into(),
                version: version.into(),
            },
        }
    }

    /// Serve on the process's stdin and stdout until stdin closes.
    pub async fn serve_stdio(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve one message per line from `reader`, writing one response per line
    /// to `writer`. Returns once `reader` reaches EOF and every in-flight
    /// request has been answered.
    pub async fn serve<R, W>(&self, mut reader: R, writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!(
            server = %self.info.name,
            tools = self.registry.tool_count(),
            "MCP server listening on stdio"
        );

        let writer = Arc::new(Mutex::new(writer));
        let mut buf = Vec::new();
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();

        loop {
            let frame = read_frame(&mut reader, &mut buf).await?;
            let message = match frame {
                Frame::Eof => break,
                Frame::Oversized(size) => {
                    warn!(size, max = MAX_MESSAGE_SIZE, "message too large");
                    Inbound::Reject(McpError::InvalidRequest(format!(
                        "message of {size} bytes exceeds {MAX_MESSAGE_SIZE}"
                    )))
                }
                Frame::Line => match std::str::from_utf8(&buf) {
                    Ok(text) if text.trim().is_empty() => continue,
                    Ok(text) => Inbound::Text(text.to_string()),
                    Err(e) => {
                        warn!(error = %e, "message is not valid UTF-8");
                        Inbound::Reject(McpError::ParseError(e.to_string()))
                    }
                },
            };

            let server = self.clone();
            let writer = Arc::clone(&writer);
            tasks.spawn(async move {
                let response = match message {
                    Inbound::Text(text) => server.handle_message(&text).await,
                    Inbound::Reject(error) => Some(JsonRpcResponse::failure(None, error)),
                };

                if let Some(response) = response {
                    let json = serde_json::to_string(&response)?;
                    let mut writer = writer.lock().await;
                    writer.write_all(json.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
                Ok(())
            });

            while let Some(joined) = tasks.try_join_next() {
                joined??;
            }
        }

        while let Some(joined) = tasks.join_next().await {
            joined??;
        }

        info!("stdin closed, MCP server stopping");
        Ok(())
    }

    /// Handle a single message. Returns `None` for notifications and for
    /// responses sent by the client.
    pub async fn handle_message(&self, text: &str) -> Option<JsonRpcResponse> {
        let message: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "unparsable message");
                return Some(JsonRpcResponse::failure(
                    None,
                    McpError::ParseError(e.to_string()),
                ));
            }
        };

        // Replies to server-initiated requests; none are ever sent.
        if message.get("method").is_none()
            && (message.get("result").is_some() || message.get("error").is_some())
        {
            return None;
        }

        let request: JsonRpcRequest = match serde_json::from_value(message.clone()) {
            Ok(request) => request,
            Err(e) => {
                let id = message
                    .get("id")
                    .and_then(|id| serde_json::from_value::<RequestId>(id.clone()).ok());
                return Some(JsonRpcResponse::failure(
                    id,
                    McpError::InvalidRequest(e.to_string()),
                ));
            }
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                request.id,
                McpError::InvalidRequest(format!(
                    "unsupported jsonrpc version {:?}",
                    request.jsonrpc
                )),
            ));
        }

        let Some(id) = request.id.clone() else {
            match request.method.as_str() {
                methods::INITIALIZED => info!("client ready"),
                other => debug!(method = %other, "notification"),
            }
            return None;
        };

        let result = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(&request),
            methods::PING => Ok(Value::Object(Default::default())),
            methods::TOOLS_LIST => self.handle_tools_list(),
            methods::TOOLS_CALL => self.handle_tools_call(&request).await,
            other => Err(McpError::MethodNotFound(other.to_string())),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err(error) => {
                debug!(method = %request.method, code = error.code(), %error, "request failed");
                JsonRpcResponse::failure(Some(id), error)
            }
        })
    }

    fn handle_initialize(&self, request: &JsonRpcRequest) -> std::result::Result<Value, McpError> {
        let params: InitializeParams = match &request.params {
            None | Some(Value::Null) => InitializeParams::default(),
            Some(_) => request.params_as()?,
        };

        let protocol_version = params
            .protocol_version
            .as_deref()
            .filter(|v| SUPPORTED_PROTOCOL_VERSIONS.contains(v))
            .unwrap_or(LATEST_PROTOCOL_VERSION)
            .to_string();

        info!(
            client = params.client_info.as_ref().map(|c| c.name.as_str()).unwrap_or("unknown"),
            %protocol_version,
            "client initialized"
        );

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
            server_info: self.info.clone(),
        };
        to_value(&result)
    }

    fn handle_tools_list(&self) -> std::result::Result<Value, McpError> {
        to_value(&ListToolsResult {
            tools: self.registry.tools(),
        })
    }

    async fn handle_tools_call(
        &self,
        request: &JsonRpcRequest,
    ) -> std::result::Result<Value, McpError> {
        let params: CallToolParams = request.params_as()?;
        info!(tool = %params.name, "tool call");
        let result = self
            .registry
            .call_tool(&params.name, params.arguments)
            .await?;
        to_value(&result)
    }
}

/// What one read from the input stream produced.
enum Frame {
    Eof,
    /// A complete line is in the buffer, without its terminator.
    Line,
    /// A line longer than `MAX_MESSAGE_SIZE` was read and discarded.
    Oversized(usize),
}

enum Inbound {
    Text(String),
    Reject(McpError),
}

/// Read the next line into `buf`, holding at most `MAX_MESSAGE_SIZE + 1`
/// bytes of it in memory.
async fn read_frame<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let limit = MAX_MESSAGE_SIZE as u64 + 1;
    let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if read == 0 {
        return Ok(Frame::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        return Ok(Frame::Line);
    }
    if buf.len() <= MAX_MESSAGE_SIZE {
        // Last line of the stream, unterminated.
        return Ok(Frame::Line);
    }

    let size = buf.len() + skip_line(reader).await?;
    buf.clear();
    Ok(Frame::Oversized(size))
}

/// Discard input up to and including the next newline. Returns the number of
/// bytes skipped before it.
async fn skip_line<R>(reader: &mut R) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut skipped = 0;
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(skipped);
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(end) => {
                reader.consume(end + 1);
                return Ok(skipped + end);
            }
            None => {
                let len = available.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> std::result::Result<Value, McpError> {
    serde_json::to_value(value).map_err(|e| McpError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::CallToolResult;
    use crate::registry::{ToolBuilder, parse_arguments};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct GreetArgs {
        name: String,
    }

    fn server() -> Server {
        let mut registry = McpRegistry::new();
        registry.register_tool(
            ToolBuilder::new("greet")
                .title("Greet")
                .description("Say hello")
                .input_schema(json!({
                    "type": "object",
                    "properties": {"name": {"type": "string"}},
                    "required": ["name"]
                }))
                .build(|args| async move {
                    let args: GreetArgs = parse_arguments(args)?;
                    let name = args.name;
                    Ok(CallToolResult::text(format!("hello {name}")))
                }),
        );
        Server::new(registry, "test-server", "1.2.3")
    }

    async fn reply(server: &Server, message: Value) -> Value {
        let response = server.handle_message(&message.to_string()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn initialize_echoes_supported_version() {
        let resp = reply(
            &server(),
            json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "initialize",
                "params": {"protocolVersion": "2024-11-05", "capabilities": {}, "clientInfo": {"name": "host", "version": "0"}}
            }),
        )
        .await;
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(resp["result"]["serverInfo"]["name"], "test-server");
        assert_eq!(resp["result"]["serverInfo"]["version"], "1.2.3");
        assert!(resp["result"]["capabilities"]["tools"].is_object());
    }

    #[tokio::test]
    async fn initialize_answers_latest_for_unknown_version() {
        let resp = reply(
            &server(),
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {"protocolVersion": "1999-01-01"}}),
        )
        .await;
        assert_eq!(resp["result"]["protocolVersion"], LATEST_PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let server = server();
        let text = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(server.handle_message(&text).await.is_none());

        let text = json!({"jsonrpc": "2.0", "method": "tools/call", "params": {"name": "greet"}})
            .to_string();
        assert!(server.handle_message(&text).await.is_none());
    }

    #[tokio::test]
    async fn ping_returns_empty_result() {
        let resp = reply(&server(), json!({"jsonrpc": "2.0", "id": "p", "method": "ping"})).await;
        assert_eq!(resp["id"], "p");
        assert_eq!(resp["result"], json!({}));
    }

    #[tokio::test]
    async fn tools_list_publishes_definitions() {
        let resp = reply(&server(), json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        let tools = resp["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "greet");
        assert_eq!(tools[0]["title"], "Greet");
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["name"]));
    }

    #[tokio::test]
    async fn tools_call_dispatches() {
        let resp = reply(
            &server(),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"name": "greet", "arguments": {"name": "alice"}}}),
        )
        .await;
        assert_eq!(
            resp["result"],
            json!({"content": [{"type": "text", "text": "hello alice"}]})
        );
    }

    #[tokio::test]
    async fn tools_call_invalid_arguments() {
        let resp = reply(
            &server(),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"name": "greet", "arguments": {}}}),
        )
        .await;
        assert_eq!(resp["error"]["code"], -32602);
    }

    #[tokio::test]
    async fn tools_call_unknown_tool() {
        let resp = reply(
            &server(),
            json!({"jsonrpc": "2.0", "id": 5, "method": "tools/call", "params": {"name": "nope"}}),
        )
        .await;
        assert_eq!(resp["error"]["code"], -32602);
        assert!(resp["error"]["message"].as_str().unwrap().contains("Unknown tool"));
    }

    #[tokio::test]
    async fn unknown_method() {
        let resp = reply(
            &server(),
            json!({"jsonrpc": "2.0", "id": 6, "method": "resources/list"}),
        )
        .await;
        assert_eq!(resp["error"]["code"], -32601);
        assert_eq!(resp["id"], 6);
    }

    #[tokio::test]
    async fn parse_error_has_null_id() {
        let response = server().handle_message("{not json").await.unwrap();
        let resp = serde_json::to_value(response).unwrap();
        assert_eq!(resp["error"]["code"], -32700);
        assert_eq!(resp["id"], Value::Null);
    }

    #[tokio::test]
    async fn invalid_request_keeps_id() {
        let resp = reply(&server(), json!({"jsonrpc": "2.0", "id": 7})).await;
        assert_eq!(resp["error"]["code"], -32600);
        assert_eq!(resp["id"], 7);

        let resp = reply(&server(), json!({"jsonrpc": "1.0", "id": 8, "method": "ping"})).await;
        assert_eq!(resp["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn client_responses_are_ignored() {
        let text = json!({"jsonrpc": "2.0", "id": 9, "result": {}}).to_string();
        assert!(server().handle_message(&text).await.is_none());
    }

    async fn serve_bytes(input: &[u8]) -> Vec<Value> {
        let (writer, mut output) = tokio::io::duplex(64 * 1024);
        server().serve(BufReader::new(input), writer).await.unwrap();

        let mut written = String::new();
        output.read_to_string(&mut written).await.unwrap();
        written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn null_id_is_answered() {
        let resp = reply(&server(), json!({"jsonrpc": "2.0", "id": null, "method": "ping"})).await;
        assert_eq!(resp["id"], Value::Null);
        assert_eq!(resp["result"], json!({}));
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_stop_serving() {
        let mut input = br#"{"jsonrpc":"2.0","id":1,"method":"ping","x":""#.to_vec();
        input.push(0xff);
        input.extend_from_slice(b"\"}\n");
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#);
        input.push(b'\n');

        let mut responses = serve_bytes(&input).await;
        responses.sort_by_key(|r| r["id"].as_i64());

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], Value::Null);
        assert_eq!(responses[0]["error"]["code"], -32700);
        assert_eq!(responses[1]["id"], 2);
        assert_eq!(responses[1]["result"], json!({}));
    }

    #[tokio::test]
    async fn oversized_line_is_rejected_and_skipped() {
        let mut input = vec![b'x'; MAX_MESSAGE_SIZE + 10];
        input.push(b'\n');
        input.extend_from_slice(br#"{"jsonrpc":"2.0","id":3,"method":"ping"}"#);
        input.push(b'\n');

        let mut responses = serve_bytes(&input).await;
        responses.sort_by_key(|r| r["id"].as_i64());

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["error"]["code"], -32600);
        assert!(
            responses[0]["error"]["message"]
                .as_str()
                .unwrap()
                .contains(&(MAX_MESSAGE_SIZE + 10).to_string())
        );
        assert_eq!(responses[1]["id"], 3);
    }

    #[tokio::test]
    async fn line_at_size_limit_is_accepted() {
        let ping = json!({"jsonrpc": "2.0", "id": 4, "method": "ping"}).to_string();
        let mut input = ping.into_bytes();
        input.resize(MAX_MESSAGE_SIZE, b' ');

        let responses = serve_bytes(&input).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0]["id"], 4);
    }

    #[tokio::test]
    async fn serve_answers_each_line_until_eof() {
        let input = [
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}).to_string(),
            json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string(),
            String::new(),
            json!({"jsonrpc": "2.0", "id": 2, "method": "tools/call", "params": {"name": "greet", "arguments": {"name": "bob"}}}).to_string(),
        ]
        .join("\n");

        let (writer, mut output) = tokio::io::duplex(64 * 1024);
        server()
            .serve(BufReader::new(input.as_bytes()), writer)
            .await
            .unwrap();

        let mut written = String::new();
        output.read_to_string(&mut written).await.unwrap();

        let mut responses: Vec<Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        responses.sort_by_key(|r| r["id"].as_i64());

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[1]["result"]["content"][0]["text"], "hello bob");
    }
}
