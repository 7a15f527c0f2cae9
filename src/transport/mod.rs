//! Transports carrying JSON-RPC to the MCP dispatcher

pub mod http;
pub mod rate_limit;
pub mod stdio;

pub use http::{router, serve, AppState};
pub use rate_limit::{client_key, RateLimitDecision, RateLimiter};
pub use stdio::{run_stdio, serve_lines};
