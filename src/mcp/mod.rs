//! MCP (Model Context Protocol) server implementation
//!
//! JSON-RPC dispatch, the SÚKL tool catalog and argument validation. The
//! transports in [`crate::transport`] feed raw request bodies into
//! [`McpServer`].

pub mod handler;
pub mod protocol;
pub mod tools;
pub mod validation;

pub use handler::{SuklHandler, INTERNAL_FAILURE_MESSAGE, SERVER_DESCRIPTION, SERVER_NAME};
pub use protocol::{
    error_codes, methods, Inbound, Incoming, InitializeResult, McpError, McpHandler, McpResponse,
    McpServer, MethodCall, Outbound, ServerInfo, ToolCallParams, ToolCallResult, ToolContent,
    ToolDefinition, PROTOCOL_VERSION,
};
pub use tools::{find_tool, get_tool_definitions, TOOL_DEFINITIONS};
pub use validation::{validate_arguments, ValidationError};
