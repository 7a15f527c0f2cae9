//! SÚKL MCP - Czech medicines registry for AI agents
//!
//! Loads the bundled SÚKL dataset into memory, builds a typo-tolerant search
//! index, and exposes nine read-only tools over MCP JSON-RPC (HTTP or stdio).

pub mod client;
pub mod config;
pub mod data;
pub mod error;
pub mod intent;
pub mod mcp;
pub mod registry;
pub mod search;
pub mod transport;
pub mod types;

pub use client::SuklClient;
pub use data::DataStore;
pub use error::{Result, SuklError};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
