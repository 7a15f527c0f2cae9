//! Error types for the SÚKL MCP server

use thiserror::Error;

/// Result type alias for SÚKL operations
pub type Result<T> = std::result::Result<T, SuklError>;

/// Main error type
///
/// Expected absences (unknown code, unknown ATC group) are never errors; the
/// query layer returns `Option` for those. This enum is reserved for failures.
#[derive(Error, Debug)]
pub enum SuklError {
    /// The bundled dataset is missing or unreadable. Fatal for every read.
    #[error("SÚKL data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Document registry error: {0}")]
    Registry(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    #[cfg(feature = "registry")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SuklError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            SuklError::Registry(_) => true,
            #[cfg(feature = "registry")]
            SuklError::Http(_) => true,
            _ => false,
        }
    }

    /// Get error code for the JSON-RPC protocol
    pub fn code(&self) -> i64 {
        match self {
            SuklError::InvalidInput(_) => -32602,
            _ => -32000,
        }
    }
}
