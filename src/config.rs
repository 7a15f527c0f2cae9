//! Runtime configuration
//!
//! Plain structs with defaults; the binaries fill them from clap arguments
//! (which in turn fall back to `SUKL_*` environment variables).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the bundled dataset
pub const DEFAULT_DATA_PATH: &str = "data/bundled-data.json";

/// Default SÚKL DLP API base
pub const DEFAULT_REGISTRY_URL: &str = "https://prehledy.sukl.cz/dlp/v1";

/// Data store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_path: PathBuf,
    /// Cache age after which the bundle is reloaded
    pub ttl: Duration,
    /// Minimum pause between retries after a failed reload
    pub retry_backoff: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            ttl: Duration::from_secs(3600),
            retry_backoff: Duration::from_secs(60),
        }
    }
}

impl StoreConfig {
    /// Build from a user-supplied path, expanding `~`
    pub fn from_path(path: &str) -> Self {
        Self {
            data_path: PathBuf::from(shellexpand::tilde(path).to_string()),
            ..Default::default()
        }
    }
}

/// Document registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_REGISTRY_URL.to_string(),
            timeout: Duration::from_millis(10_000),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub bind_addr: SocketAddr,
    /// Requests per client per minute (0 = unlimited)
    pub rate_limit_per_minute: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            rate_limit_per_minute: 100,
        }
    }
}
