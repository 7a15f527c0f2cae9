//! SÚKL CLI
//!
//! Command-line access to the same tools the MCP server exposes.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use sukl_mcp::config::{RegistryConfig, StoreConfig, DEFAULT_DATA_PATH, DEFAULT_REGISTRY_URL};
use sukl_mcp::data::DataStore;
use sukl_mcp::intent::parse_query;
use sukl_mcp::mcp::{tools, McpHandler, SuklHandler};
use sukl_mcp::registry::default_registry;
use sukl_mcp::SuklClient;

#[derive(Parser)]
#[command(name = "sukl-cli")]
#[command(about = "Query the Czech SÚKL medicines registry")]
#[command(version)]
struct Cli {
    /// Bundled dataset path
    #[arg(long, env = "SUKL_DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    data_path: String,

    /// SÚKL document registry base URL
    #[arg(long, env = "SUKL_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Document registry request timeout in ms
    #[arg(long, env = "SUKL_REGISTRY_TIMEOUT_MS", default_value = "10000")]
    registry_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fuzzy search by name, substance, code or holder
    Search {
        /// Search query
        query: String,
        /// Maximum results
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
    /// Show one medicine by SÚKL code
    Get {
        /// SÚKL code (with or without leading zeros)
        code: String,
    },
    /// Show an ATC group
    Atc {
        /// ATC code
        code: String,
        /// Include the medicines in the group
        #[arg(short, long)]
        medicines: bool,
        /// Maximum medicines listed
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },
    /// Find pharmacies
    Pharmacies {
        /// City name (substring)
        #[arg(short, long)]
        city: Option<String>,
        /// Postal code prefix
        #[arg(short, long)]
        postal_code: Option<String>,
        /// Only pharmacies open 24 hours
        #[arg(long)]
        is_24h: bool,
    },
    /// Show pricing and reimbursement
    Reimbursement {
        /// SÚKL code
        code: String,
    },
    /// Check availability of one or more medicines
    Availability {
        /// SÚKL codes
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Show the patient leaflet (PIL) link
    Pil {
        /// SÚKL code
        code: String,
    },
    /// Show the SPC link
    Spc {
        /// SÚKL code
        code: String,
    },
    /// Answer a free-text question ("lékárna v Brně", "N02BE01", ...)
    Ask {
        /// Question text
        text: Vec<String>,
    },
    /// Show dataset statistics
    Stats,
}

impl Commands {
    /// Tool name and arguments for commands that map onto a tool call
    fn tool_call(&self) -> Option<(&'static str, Value)> {
        let call = match self {
            Commands::Search { query, limit } => {
                (tools::SEARCH_MEDICINE, json!({ "query": query, "limit": limit }))
            }
            Commands::Get { code } => (tools::GET_MEDICINE_DETAILS, json!({ "sukl_code": code })),
            Commands::Atc {
                code,
                medicines,
                limit,
            } => (
                tools::GET_ATC_INFO,
                json!({ "atc_code": code, "include_medicines": medicines, "medicines_limit": limit }),
            ),
            Commands::Pharmacies {
                city,
                postal_code,
                is_24h,
            } => {
                let mut args = json!({ "city": city, "postal_code": postal_code });
                if *is_24h {
                    args["is_24h"] = json!(true);
                }
                (tools::FIND_PHARMACIES, args)
            }
            Commands::Reimbursement { code } => {
                (tools::GET_REIMBURSEMENT, json!({ "sukl_code": code }))
            }
            Commands::Availability { codes } if codes.len() == 1 => {
                (tools::CHECK_AVAILABILITY, json!({ "sukl_code": codes[0] }))
            }
            Commands::Availability { codes } => {
                (tools::BATCH_CHECK_AVAILABILITY, json!({ "sukl_codes": codes }))
            }
            Commands::Pil { code } => (tools::GET_PIL_CONTENT, json!({ "sukl_code": code })),
            Commands::Spc { code } => (tools::GET_SPC_CONTENT, json!({ "sukl_code": code })),
            Commands::Ask { text } => {
                let intent = parse_query(&text.join(" "));
                (intent.tool_name(), intent.arguments())
            }
            Commands::Stats => return None,
        };
        Some(call)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let store = Arc::new(DataStore::from_config(StoreConfig::from_path(&cli.data_path)));
    let registry = default_registry(&RegistryConfig {
        base_url: cli.registry_url.clone(),
        timeout: Duration::from_millis(cli.registry_timeout_ms),
    })?;
    let handler = SuklHandler::new(SuklClient::new(store, registry));

    let Some((tool, arguments)) = cli.command.tool_call() else {
        let stats = handler
            .client()
            .stats()
            .await
            .context("failed to load the SÚKL dataset")?;
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    };

    let result = handler.call_tool(tool, arguments).await;
    let text = result.first_text().unwrap_or_default();
    if result.is_error() {
        bail!("{}", text);
    }
    println!("{}", text);

    Ok(())
}
