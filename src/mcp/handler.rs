//! SÚKL tool execution behind the MCP dispatcher

use std::time::Instant;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::protocol::{methods, McpHandler, ServerInfo, ToolCallResult, ToolDefinition};
use super::tools::{self, find_tool, get_tool_definitions};
use super::validation::validate_arguments;
use crate::client::SuklClient;
use crate::error::{Result, SuklError};
use crate::types::{DocumentKind, PharmacyFilter};

/// Server name reported to clients
pub const SERVER_NAME: &str = "sukl-mcp";

/// Server description reported to clients
pub const SERVER_DESCRIPTION: &str =
    "MCP server pro českou databázi léčivých přípravků SÚKL (~68k léků)";

/// Generic message for unexpected failures; details stay in the server log
pub const INTERNAL_FAILURE_MESSAGE: &str = "Chyba při zpracování požadavku. Zkuste to znovu.";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct CodeArgs {
    sukl_code: String,
}

#[derive(Debug, Deserialize)]
struct PharmacyArgs {
    city: Option<String>,
    postal_code: Option<String>,
    is_24h: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct AtcArgs {
    atc_code: String,
    include_medicines: bool,
    medicines_limit: u32,
}

#[derive(Debug, Deserialize)]
struct BatchArgs {
    sukl_codes: Vec<String>,
}

/// Successful tool outcome
enum ToolOutput {
    Data(Value),
    /// Requested entity does not exist; not a failure
    NotFound(String),
}

fn parse<T: DeserializeOwned>(args: Map<String, Value>) -> Result<T> {
    serde_json::from_value(Value::Object(args)).map_err(|e| SuklError::InvalidInput(e.to_string()))
}

fn data(value: &impl Serialize) -> Result<ToolOutput> {
    Ok(ToolOutput::Data(serde_json::to_value(value)?))
}

fn found_or<T: Serialize>(value: Option<T>, not_found: impl FnOnce() -> String) -> Result<ToolOutput> {
    match value {
        Some(value) => data(&value),
        None => Ok(ToolOutput::NotFound(not_found())),
    }
}

/// MCP handler exposing the nine SÚKL tools
pub struct SuklHandler {
    client: SuklClient,
}

impl SuklHandler {
    pub fn new(client: SuklClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &SuklClient {
        &self.client
    }

    async fn run(&self, name: &str, arguments: &Value) -> ToolCallResult {
        let Some(tool) = find_tool(name) else {
            return ToolCallResult::error(format!("Neznámý nástroj: '{}'", name));
        };

        let args = match validate_arguments(&tool.input_schema, arguments) {
            Ok(args) => args,
            Err(e) => return ToolCallResult::error(e.to_string()),
        };

        match self.execute(name, args).await {
            Ok(ToolOutput::Data(value)) => ToolCallResult::json(&value),
            Ok(ToolOutput::NotFound(message)) => ToolCallResult::text(message),
            Err(e) => {
                tracing::error!(tool = name, code = e.code(), error = %e, "MCP tool failed");
                ToolCallResult::error(INTERNAL_FAILURE_MESSAGE)
            }
        }
    }

    async fn execute(&self, name: &str, args: Map<String, Value>) -> Result<ToolOutput> {
        match name {
            tools::SEARCH_MEDICINE => {
                let args: SearchArgs = parse(args)?;
                data(&self.client.search(&args.query, args.limit as usize).await?)
            }
            tools::GET_MEDICINE_DETAILS => {
                let CodeArgs { sukl_code } = parse(args)?;
                found_or(self.client.get_by_code(&sukl_code).await?, || {
                    format!("Lék s SÚKL kódem '{}' nebyl nalezen.", sukl_code)
                })
            }
            tools::CHECK_AVAILABILITY => {
                let CodeArgs { sukl_code } = parse(args)?;
                found_or(self.client.check_availability(&sukl_code).await?, || {
                    format!("Lék s SÚKL kódem '{}' nebyl nalezen.", sukl_code)
                })
            }
            tools::FIND_PHARMACIES => {
                let args: PharmacyArgs = parse(args)?;
                let filter = PharmacyFilter {
                    city: args.city,
                    postal_code: args.postal_code,
                    is_24h: args.is_24h,
                };
                data(&self.client.find_pharmacies(&filter).await?)
            }
            tools::GET_ATC_INFO => {
                let args: AtcArgs = parse(args)?;
                let not_found = || format!("ATC kód '{}' nebyl nalezen.", args.atc_code);
                if args.include_medicines {
                    let detail = self
                        .client
                        .get_atc_detail(&args.atc_code, args.medicines_limit as usize)
                        .await?;
                    found_or(detail, not_found)
                } else {
                    found_or(self.client.get_atc_info(&args.atc_code).await?, not_found)
                }
            }
            tools::GET_REIMBURSEMENT => {
                let CodeArgs { sukl_code } = parse(args)?;
                found_or(self.client.get_reimbursement(&sukl_code).await?, || {
                    format!(
                        "Informace o úhradě pro SÚKL kód '{}' nejsou k dispozici.",
                        sukl_code
                    )
                })
            }
            tools::GET_PIL_CONTENT => {
                let CodeArgs { sukl_code } = parse(args)?;
                let document = self
                    .client
                    .get_document_content(&sukl_code, DocumentKind::Pil)
                    .await?;
                found_or(document, || {
                    format!("Příbalový leták pro SÚKL kód '{}' nebyl nalezen.", sukl_code)
                })
            }
            tools::GET_SPC_CONTENT => {
                let CodeArgs { sukl_code } = parse(args)?;
                let document = self
                    .client
                    .get_document_content(&sukl_code, DocumentKind::Spc)
                    .await?;
                found_or(document, || {
                    format!("SPC pro SÚKL kód '{}' nebylo nalezeno.", sukl_code)
                })
            }
            tools::BATCH_CHECK_AVAILABILITY => {
                let BatchArgs { sukl_codes } = parse(args)?;
                data(&self.client.batch_check_availability(&sukl_codes).await?)
            }
            other => Err(SuklError::Internal(format!(
                "tool '{}' has no executor",
                other
            ))),
        }
    }
}

#[async_trait]
impl McpHandler for SuklHandler {
    fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: SERVER_NAME.to_string(),
            version: crate::VERSION.to_string(),
            description: SERVER_DESCRIPTION.to_string(),
        }
    }

    fn list_tools(&self) -> Vec<ToolDefinition> {
        get_tool_definitions()
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> ToolCallResult {
        let call_id = Uuid::new_v4();
        let started = Instant::now();

        let result = self.run(name, &arguments).await;

        tracing::info!(
            call_id = %call_id,
            tool = name,
            arguments = %arguments,
            elapsed_ms = started.elapsed().as_millis() as u64,
            outcome = if result.is_error() { "error" } else { "ok" },
            "MCP tool call"
        );

        result
    }

    async fn notify(&self, method: &str) {
        if method == methods::INITIALIZED {
            tracing::info!("MCP client initialized");
        } else {
            tracing::debug!(method, "Notification received");
        }
    }
}
