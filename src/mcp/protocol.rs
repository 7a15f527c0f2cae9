//! MCP JSON-RPC protocol implementation

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// JSON-RPC version tag every envelope must carry
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP protocol revision implemented by this server
pub const PROTOCOL_VERSION: &str = "2025-03-26";

/// Standard MCP methods
pub mod methods {
    pub const INITIALIZE: &str = "initialize";
    pub const INITIALIZED: &str = "notifications/initialized";
    pub const PING: &str = "ping";
    pub const LIST_TOOLS: &str = "tools/list";
    pub const CALL_TOOL: &str = "tools/call";
}

/// JSON-RPC error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Implementation-defined server error (rate limiting)
    pub const SERVER_ERROR: i64 = -32000;
}

/// MCP JSON-RPC response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpResponse {
    pub jsonrpc: String,
    /// Echoed request id; `null` when the request could not be identified
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<McpError>,
}

/// MCP error object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl McpResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(McpError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Success response from any serializable result
    pub fn from_result(id: Value, result: &impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::success(id, value),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON-RPC result");
                Self::error(id, error_codes::INTERNAL_ERROR, "Internal error")
            }
        }
    }

    pub fn parse_error() -> Self {
        Self::error(Value::Null, error_codes::PARSE_ERROR, "Parse error: invalid JSON")
    }

    pub fn invalid_request(id: Value) -> Self {
        Self::error(id, error_codes::INVALID_REQUEST, "Invalid Request")
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// `tools/call` parameters as received
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallParams {
    /// Tool name; `None` when absent, empty or not a string
    pub name: Option<String>,
    /// Raw arguments; absent or `null` becomes an empty object
    pub arguments: Value,
}

impl ToolCallParams {
    fn from_params(params: Option<&Value>) -> Self {
        let name = params
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let arguments = match params.and_then(|p| p.get("arguments")) {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(other) => other.clone(),
        };
        Self { name, arguments }
    }
}

/// Routed method of a request that expects a response
#[derive(Debug, Clone, PartialEq)]
pub enum MethodCall {
    Initialize,
    Ping,
    ListTools,
    CallTool(ToolCallParams),
    Unknown(String),
}

impl MethodCall {
    fn route(method: &str, params: Option<&Value>) -> Self {
        match method {
            methods::INITIALIZE => MethodCall::Initialize,
            methods::PING => MethodCall::Ping,
            methods::LIST_TOOLS => MethodCall::ListTools,
            methods::CALL_TOOL => MethodCall::CallTool(ToolCallParams::from_params(params)),
            other => MethodCall::Unknown(other.to_string()),
        }
    }
}

/// One decoded JSON-RPC envelope
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Request { id: Value, call: MethodCall },
    /// No id (or `id: null`): never answered
    Notification { method: String },
}

impl Incoming {
    /// Decode one envelope; an invalid one yields the error response to send
    pub fn from_value(value: &Value) -> std::result::Result<Self, McpResponse> {
        let Some(object) = value.as_object() else {
            return Err(McpResponse::invalid_request(Value::Null));
        };

        let id = object.get("id").cloned().unwrap_or(Value::Null);
        let version_ok = object.get("jsonrpc").and_then(Value::as_str) == Some(JSONRPC_VERSION);
        let Some(method) = object.get("method").and_then(Value::as_str) else {
            return Err(McpResponse::invalid_request(id));
        };
        if !version_ok {
            return Err(McpResponse::invalid_request(id));
        }

        if id.is_null() {
            return Ok(Incoming::Notification {
                method: method.to_string(),
            });
        }

        Ok(Incoming::Request {
            call: MethodCall::route(method, object.get("params")),
            id,
        })
    }
}

/// A parsed request body: one envelope or a batch
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Single(Value),
    Batch(Vec<Value>),
}

impl Inbound {
    /// Parse raw JSON text; malformed JSON yields the parse error response
    pub fn parse(body: &str) -> std::result::Result<Self, McpResponse> {
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Array(items)) => Ok(Inbound::Batch(items)),
            Ok(value) => Ok(Inbound::Single(value)),
            Err(_) => Err(McpResponse::parse_error()),
        }
    }
}

/// What the transport should send back
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Single(McpResponse),
    Batch(Vec<McpResponse>),
    /// Accepted without a body (notifications only)
    NoContent,
}

impl Outbound {
    pub fn is_empty(&self) -> bool {
        matches!(self, Outbound::NoContent)
    }

    /// JSON body, if any
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Outbound::Single(response) => serde_json::to_value(response).ok(),
            Outbound::Batch(responses) => serde_json::to_value(responses).ok(),
            Outbound::NoContent => None,
        }
    }
}

/// MCP tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// MCP initialize result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Server info
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl InitializeResult {
    pub fn new(server_info: ServerInfo) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info,
        }
    }
}

/// Tool call result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolCallResult {
    /// Create a text result
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: None,
        }
    }

    /// Create a JSON result
    pub fn json(value: &impl Serialize) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_default();
        Self::text(text)
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error == Some(true)
    }

    /// Text of the first content item
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|c| match c {
            ToolContent::Text { text } => text.as_str(),
        })
    }
}

/// Trait for handling MCP requests
#[async_trait]
pub trait McpHandler: Send + Sync {
    fn server_info(&self) -> ServerInfo;

    fn list_tools(&self) -> Vec<ToolDefinition>;

    /// Run a tool. Failures are reported inside the result, never as
    /// protocol errors.
    async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult;

    async fn notify(&self, method: &str) {
        tracing::debug!(method, "Notification received");
    }
}

/// Transport-independent JSON-RPC dispatcher
pub struct McpServer<H>
where
    H: McpHandler,
{
    handler: H,
}

impl<H: McpHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Handle a raw request body
    pub async fn handle_str(&self, body: &str) -> Outbound {
        match Inbound::parse(body) {
            Ok(inbound) => self.handle(inbound).await,
            Err(response) => Outbound::Single(response),
        }
    }

    /// Handle one envelope or a batch. Batch entries run concurrently; the
    /// responses keep request order and leave out notifications.
    pub async fn handle(&self, inbound: Inbound) -> Outbound {
        match inbound {
            Inbound::Single(value) => match self.handle_value(&value).await {
                Some(response) => Outbound::Single(response),
                None => Outbound::NoContent,
            },
            Inbound::Batch(values) => {
                let responses: Vec<McpResponse> =
                    join_all(values.iter().map(|v| self.handle_value(v)))
                        .await
                        .into_iter()
                        .flatten()
                        .collect();
                if responses.is_empty() {
                    Outbound::NoContent
                } else {
                    Outbound::Batch(responses)
                }
            }
        }
    }

    /// Handle a single envelope; `None` for notifications
    pub async fn handle_value(&self, value: &Value) -> Option<McpResponse> {
        match Incoming::from_value(value) {
            Err(response) => Some(response),
            Ok(Incoming::Notification { method }) => {
                self.handler.notify(&method).await;
                None
            }
            Ok(Incoming::Request { id, call }) => Some(self.dispatch(id, call).await),
        }
    }

    async fn dispatch(&self, id: Value, call: MethodCall) -> McpResponse {
        match call {
            MethodCall::Initialize => {
                McpResponse::from_result(id, &InitializeResult::new(self.handler.server_info()))
            }
            MethodCall::Ping => McpResponse::success(id, json!({})),
            MethodCall::ListTools => {
                McpResponse::success(id, json!({ "tools": self.handler.list_tools() }))
            }
            MethodCall::CallTool(ToolCallParams { name: None, .. }) => McpResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "Invalid params: missing tool name",
            ),
            MethodCall::CallTool(ToolCallParams {
                name: Some(name),
                arguments,
            }) => {
                let result = self.handler.call_tool(&name, arguments).await;
                McpResponse::from_result(id, &result)
            }
            MethodCall::Unknown(method) => McpResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ),
        }
    }
}
