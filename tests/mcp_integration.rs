//! End-to-end tests: JSON-RPC dispatch over the fixture bundle, the axum
//! router and the stdio line transport.
//!
//! Run with: cargo test --test mcp_integration

use std::sync::Arc;

use serde_json::{json, Value};
use sukl_mcp::config::{HttpConfig, RegistryConfig, StoreConfig};
use sukl_mcp::data::{BundledData, DataStore};
use sukl_mcp::mcp::{McpServer, Outbound, SuklHandler};
use sukl_mcp::registry::OfflineRegistry;
use sukl_mcp::SuklClient;

fn fixture_bundle() -> BundledData {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/bundle.json");
    let bytes = std::fs::read(path).expect("Failed to read bundle.json fixture");
    BundledData::from_slice(&bytes).expect("Failed to parse fixture bundle")
}

fn server_with(store: DataStore) -> Arc<McpServer<SuklHandler>> {
    let registry = Arc::new(OfflineRegistry::new(&RegistryConfig::default()));
    let client = SuklClient::new(Arc::new(store), registry);
    Arc::new(McpServer::new(SuklHandler::new(client)))
}

fn fixture_server() -> Arc<McpServer<SuklHandler>> {
    server_with(DataStore::from_bundle(fixture_bundle()))
}

async fn call(server: &McpServer<SuklHandler>, request: Value) -> Value {
    match server.handle_str(&request.to_string()).await {
        Outbound::Single(response) => serde_json::to_value(response).unwrap(),
        other => panic!("expected a single response, got {:?}", other),
    }
}

async fn call_tool(server: &McpServer<SuklHandler>, name: &str, arguments: Value) -> Value {
    call(
        server,
        json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments }
        }),
    )
    .await["result"]
        .clone()
}

/// Payload of a successful tool result
fn payload(result: &Value) -> Value {
    assert_ne!(result["isError"], json!(true), "unexpected tool error: {}", result);
    let text = result["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

fn text(result: &Value) -> &str {
    result["content"][0]["text"].as_str().unwrap()
}

// ============================================================================
// DISPATCHER
// ============================================================================

mod dispatcher {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_initialize_then_list_tools() {
        let server = fixture_server();

        let init = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}),
        )
        .await;
        assert_eq!(init["result"]["protocolVersion"], "2025-03-26");
        assert_eq!(init["result"]["serverInfo"]["name"], "sukl-mcp");
        assert_eq!(init["result"]["capabilities"]["tools"]["listChanged"], false);

        let list = call(&server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
        assert_eq!(list["id"], 2);
        assert_eq!(list["result"]["tools"].as_array().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_protocol_errors() {
        let server = fixture_server();

        let unknown = call(&server, json!({"jsonrpc": "2.0", "id": "a", "method": "resources/list"})).await;
        assert_eq!(unknown["id"], "a");
        assert_eq!(unknown["error"]["code"], -32601);
        assert_eq!(unknown["error"]["message"], "Method not found: resources/list");

        let nameless = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": {"arguments": {}}}),
        )
        .await;
        assert_eq!(nameless["error"]["code"], -32602);

        match server.handle_str("{not json").await {
            Outbound::Single(response) => {
                assert_eq!(response.id, Value::Null);
                assert_eq!(response.error.unwrap().code, -32700);
            }
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_notifications_are_silent() {
        let server = fixture_server();

        let single = server
            .handle_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(single.is_empty());

        let batch = server
            .handle_str(
                r#"[{"jsonrpc":"2.0","method":"notifications/initialized"},
                    {"jsonrpc":"2.0","id":null,"method":"ping"}]"#,
            )
            .await;
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_batch_keeps_order_and_skips_notifications() {
        let server = fixture_server();
        let body = json!([
            {"jsonrpc": "2.0", "id": 10, "method": "ping"},
            {"jsonrpc": "2.0", "method": "notifications/initialized"},
            {"jsonrpc": "2.0", "id": 11, "method": "tools/call",
             "params": {"name": "get-medicine-details", "arguments": {"sukl_code": "94156"}}},
            {"jsonrpc": "2.0", "id": 12, "method": "nope"}
        ]);

        let Outbound::Batch(responses) = server.handle_str(&body.to_string()).await else {
            panic!("expected batch response");
        };
        let ids: Vec<Value> = responses.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![json!(10), json!(11), json!(12)]);
        assert!(responses[2].is_error());
    }
}

// ============================================================================
// TOOLS OVER THE FIXTURE BUNDLE
// ============================================================================

mod tools {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_search_medicine() {
        let server = fixture_server();
        let result = call_tool(&server, "search-medicine", json!({"query": "paralen", "limit": 3})).await;
        let found = payload(&result);

        assert_eq!(found["medicines"][0]["name"], "PARALEN 500");
        assert!(found["medicines"].as_array().unwrap().len() <= 3);
        assert_eq!(found["total_count"], found["medicines"].as_array().unwrap().len());
    }

    #[tokio::test]
    async fn test_search_validation_is_tool_level() {
        let server = fixture_server();
        let result = call_tool(&server, "search-medicine", json!({"query": ""})).await;

        assert_eq!(result["isError"], true);
        assert_eq!(text(&result), "Parametr 'query' musí být neprázdný řetězec.");
    }

    #[tokio::test]
    async fn test_medicine_details_zero_padding() {
        let server = fixture_server();

        let padded = payload(&call_tool(&server, "get-medicine-details", json!({"sukl_code": "0254045"})).await);
        let bare = payload(&call_tool(&server, "get-medicine-details", json!({"sukl_code": "254045"})).await);
        assert_eq!(padded, bare);
        assert_eq!(padded["name"], "PARALEN 500");

        let missing = call_tool(&server, "get-medicine-details", json!({"sukl_code": "9999999"})).await;
        assert_eq!(missing["isError"], Value::Null);
        assert_eq!(text(&missing), "Lék s SÚKL kódem '9999999' nebyl nalezen.");
    }

    #[tokio::test]
    async fn test_atc_info() {
        let server = fixture_server();

        let group = payload(
            &call_tool(
                &server,
                "get-atc-info",
                json!({"atc_code": "N02BE", "include_medicines": true, "medicines_limit": 10}),
            )
            .await,
        );
        assert_eq!(group["code"], "N02BE");
        // PARALEN 500 and PANADOL NOVUM share N02BE01
        assert_eq!(group["medicines"].as_array().unwrap().len(), 2);

        let unknown = call_tool(&server, "get-atc-info", json!({"atc_code": "Z99"})).await;
        assert_eq!(text(&unknown), "ATC kód 'Z99' nebyl nalezen.");
    }

    #[tokio::test]
    async fn test_find_pharmacies() {
        let server = fixture_server();

        let brno = payload(&call_tool(&server, "find-pharmacies", json!({"city": "brno"})).await);
        assert_eq!(brno.as_array().unwrap().len(), 2);

        let nonstop = payload(
            &call_tool(&server, "find-pharmacies", json!({"city": "Praha", "is_24h": true})).await,
        );
        assert_eq!(nonstop.as_array().unwrap().len(), 1);
        assert_eq!(nonstop[0]["id"], "10054321");

        let by_zip = payload(&call_tool(&server, "find-pharmacies", json!({"postal_code": "150"})).await);
        assert_eq!(by_zip.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reimbursement() {
        let server = fixture_server();

        let paralen = payload(&call_tool(&server, "get-reimbursement", json!({"sukl_code": "0254045"})).await);
        assert_eq!(paralen["patient_surcharge"], 15.5);

        let missing = call_tool(&server, "get-reimbursement", json!({"sukl_code": "94156"})).await;
        assert_eq!(
            text(&missing),
            "Informace o úhradě pro SÚKL kód '94156' nejsou k dispozici."
        );
    }

    #[tokio::test]
    async fn test_availability() {
        let server = fixture_server();

        let single = payload(&call_tool(&server, "check-availability", json!({"sukl_code": "0254045"})).await);
        assert_eq!(single["sukl_code"], "254045");
        assert_eq!(single["status"], "available");

        let batch = payload(
            &call_tool(
                &server,
                "batch-check-availability",
                json!({"sukl_codes": ["254045", "32001", "9999999"]}),
            )
            .await,
        );
        assert_eq!(batch["total_checked"], 3);
        // unknown codes are left out
        assert_eq!(batch["results"].as_array().unwrap().len(), 2);
        assert_eq!(batch["available_count"], 1);
    }

    #[tokio::test]
    async fn test_batch_availability_caps_at_fifty() {
        let server = fixture_server();
        let codes: Vec<String> = (0..60).map(|_| "254045".to_string()).collect();

        let batch = payload(
            &call_tool(&server, "batch-check-availability", json!({"sukl_codes": codes})).await,
        );
        assert_eq!(batch["total_checked"], 50);
        assert_eq!(batch["results"].as_array().unwrap().len(), 50);
    }

    #[tokio::test]
    async fn test_documents_degrade_without_registry() {
        let server = fixture_server();

        let pil = payload(&call_tool(&server, "get-pil-content", json!({"sukl_code": "254045"})).await);
        assert_eq!(pil["document_type"], "PIL");
        assert_eq!(pil["title"], "PIL - PARALEN 500");
        assert_eq!(pil["content"], "Nepodařilo se získat dokument z SÚKL API.");
        assert_eq!(pil["document_url"], Value::Null);

        let missing = call_tool(&server, "get-spc-content", json!({"sukl_code": "9999999"})).await;
        assert_eq!(text(&missing), "SPC pro SÚKL kód '9999999' nebylo nalezeno.");
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = fixture_server();
        let result = call_tool(&server, "delete-everything", json!({})).await;

        assert_eq!(result["isError"], true);
        assert_eq!(text(&result), "Neznámý nástroj: 'delete-everything'");
    }

    #[tokio::test]
    async fn test_every_required_argument_is_enforced() {
        let server = fixture_server();
        let mut checked = 0;

        for tool in sukl_mcp::mcp::get_tool_definitions() {
            let required: Vec<&str> = tool.input_schema["required"]
                .as_array()
                .map(|names| names.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let Some(first) = required.first() else {
                continue;
            };

            let result = call_tool(&server, &tool.name, json!({})).await;
            assert_eq!(result["isError"], true, "{} accepted empty arguments", tool.name);
            assert!(
                text(&result).contains(&format!("'{}'", first)),
                "{}: {}",
                tool.name,
                text(&result)
            );
            checked += 1;
        }

        assert_eq!(checked, 8);
    }

    #[tokio::test]
    async fn test_missing_dataset_is_tool_error() {
        let store = DataStore::from_config(StoreConfig::from_path("/nonexistent/sukl/bundle.json"));
        let server = server_with(store);

        let result = call_tool(&server, "search-medicine", json!({"query": "paralen"})).await;
        assert_eq!(result["isError"], true);
        assert_eq!(text(&result), sukl_mcp::mcp::INTERNAL_FAILURE_MESSAGE);
    }
}

// ============================================================================
// HTTP TRANSPORT
// ============================================================================

mod http {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use pretty_assertions::assert_eq;
    use sukl_mcp::transport::{router, AppState};
    use tower::ServiceExt;

    fn app(server: Arc<McpServer<SuklHandler>>, rate_limit_per_minute: u32) -> Router {
        let config = HttpConfig {
            rate_limit_per_minute,
            ..HttpConfig::default()
        };
        router(AppState::new(server, &config))
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/mcp")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_post_request() {
        let response = app(fixture_server(), 0)
            .oneshot(post(r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["id"], 7);
        assert_eq!(body["result"], json!({}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let response = app(fixture_server(), 0).oneshot(post("{oops")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn test_notification_is_202() {
        let response = app(fixture_server(), 0)
            .oneshot(post(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_server_identity() {
        let response = app(fixture_server(), 0).oneshot(get("/mcp")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["name"], "sukl-mcp");
        assert_eq!(body["protocol"], "MCP Streamable HTTP");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(fixture_server(), 0).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["data"]["medicines"], 7);

        let broken = server_with(DataStore::from_config(StoreConfig::from_path(
            "/nonexistent/sukl/bundle.json",
        )));
        let response = app(broken, 0).oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "unavailable");
    }

    #[tokio::test]
    async fn test_rate_limit() {
        let app = app(fixture_server(), 1);
        let ping = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;

        let first = app.clone().oneshot(post(ping)).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.oneshot(post(ping)).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(second.headers().contains_key(header::RETRY_AFTER));
        let body = json_body(second).await;
        assert_eq!(body["error"]["code"], -32000);
    }
}

// ============================================================================
// STDIO TRANSPORT
// ============================================================================

mod stdio {
    use super::*;
    use pretty_assertions::assert_eq;
    use sukl_mcp::transport::serve_lines;

    #[tokio::test]
    async fn test_one_line_per_response() {
        let server = fixture_server();
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            "\n",
            "not json\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#,
            "\n",
        );
        let mut output = Vec::new();

        serve_lines(server.as_ref(), input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["id"], 1);
        assert_eq!(lines[1]["error"]["code"], -32700);
        assert_eq!(lines[2]["id"], 2);
    }
}
