//! SÚKL MCP Server
//!
//! Run with: sukl-mcp-server --data-path data/bundled-data.json

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sukl_mcp::config::{
    HttpConfig, RegistryConfig, StoreConfig, DEFAULT_DATA_PATH, DEFAULT_REGISTRY_URL,
};
use sukl_mcp::data::DataStore;
use sukl_mcp::mcp::{McpServer, SuklHandler};
use sukl_mcp::registry::default_registry;
use sukl_mcp::transport;
use sukl_mcp::SuklClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Http,
    Stdio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "sukl-mcp-server")]
#[command(about = "MCP server for the Czech SÚKL medicines registry")]
#[command(version)]
struct Args {
    /// Bundled dataset path
    #[arg(long, env = "SUKL_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    data_path: String,

    /// Reload the dataset after this many seconds
    #[arg(long, env = "SUKL_CACHE_TTL_SECS", default_value = "3600")]
    cache_ttl_secs: u64,

    /// SÚKL document registry base URL
    #[arg(long, env = "SUKL_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Document registry request timeout in ms
    #[arg(long, env = "SUKL_REGISTRY_TIMEOUT_MS", default_value = "10000")]
    registry_timeout_ms: u64,

    /// Transport to serve on
    #[arg(long, env = "SUKL_TRANSPORT", value_enum, default_value = "http")]
    transport: Transport,

    /// HTTP bind address
    #[arg(long, env = "SUKL_BIND_ADDR", default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Requests per client IP per minute (0 = disabled)
    #[arg(long, env = "SUKL_RATE_LIMIT", default_value = "100")]
    rate_limit_per_minute: u32,

    /// Log output format
    #[arg(long, env = "SUKL_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Load the dataset at startup instead of on the first request
    #[arg(long, env = "SUKL_PRELOAD")]
    preload: bool,
}

fn init_logging(format: LogFormat) {
    // stderr only: stdout carries the stdio protocol
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    let store_config = StoreConfig {
        ttl: Duration::from_secs(args.cache_ttl_secs),
        ..StoreConfig::from_path(&args.data_path)
    };
    let registry_config = RegistryConfig {
        base_url: args.registry_url,
        timeout: Duration::from_millis(args.registry_timeout_ms),
    };
    let http_config = HttpConfig {
        bind_addr: args.bind,
        rate_limit_per_minute: args.rate_limit_per_minute,
    };

    tracing::info!(
        version = sukl_mcp::VERSION,
        data_path = %store_config.data_path.display(),
        transport = ?args.transport,
        "Starting SÚKL MCP server"
    );

    let store = Arc::new(DataStore::from_config(store_config));
    if args.preload {
        store
            .load()
            .await
            .context("failed to preload the SÚKL dataset")?;
    }

    let registry = default_registry(&registry_config)
        .context("failed to create document registry client")?;
    let client = SuklClient::new(store, registry);
    let server = Arc::new(McpServer::new(SuklHandler::new(client)));

    match args.transport {
        Transport::Http => transport::serve(server, &http_config).await?,
        Transport::Stdio => transport::run_stdio(server.as_ref()).await?,
    }

    Ok(())
}
