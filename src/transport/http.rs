//! Streamable HTTP transport (axum)
//!
//! - `POST /mcp`: JSON-RPC request or batch
//! - `GET /mcp`: server identity
//! - `GET /health`: dataset statistics

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::rate_limit::{client_key, RateLimiter, RATE_LIMIT_MESSAGE};
use crate::config::HttpConfig;
use crate::error::Result;
use crate::mcp::{error_codes, Inbound, McpHandler, McpResponse, McpServer, SuklHandler, PROTOCOL_VERSION};

/// Shared state of the HTTP transport
#[derive(Clone)]
pub struct AppState {
    server: Arc<McpServer<SuklHandler>>,
    limiter: Option<Arc<RateLimiter>>,
}

impl AppState {
    pub fn new(server: Arc<McpServer<SuklHandler>>, config: &HttpConfig) -> Self {
        let limiter = (config.rate_limit_per_minute > 0)
            .then(|| Arc::new(RateLimiter::new(config.rate_limit_per_minute)));
        Self { server, limiter }
    }
}

/// Build the router with CORS and request tracing
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("mcp-session-id"),
        ]);

    Router::new()
        .route("/mcp", get(server_identity).post(handle_mcp))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(server: Arc<McpServer<SuklHandler>>, config: &HttpConfig) -> Result<()> {
    let app = router(AppState::new(server, config));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        rate_limit_per_minute = config.rate_limit_per_minute,
        "SÚKL MCP server listening"
    );
    axum::serve(listener, app).await?;
    Ok(())
}

async fn handle_mcp(State(state): State<AppState>, headers: HeaderMap, body: String) -> Response {
    if let Some(limiter) = &state.limiter {
        let client = client_key(&headers);
        let decision = limiter.check(&client).await;
        if !decision.allowed {
            tracing::warn!(client = %client, "Rate limit exceeded");
            let response = McpResponse::error(
                serde_json::Value::Null,
                error_codes::SERVER_ERROR,
                RATE_LIMIT_MESSAGE,
            );
            let mut reply = (StatusCode::TOO_MANY_REQUESTS, Json(response)).into_response();
            if let Ok(value) = HeaderValue::from_str(&decision.reset_seconds.to_string()) {
                reply.headers_mut().insert(header::RETRY_AFTER, value);
            }
            return reply;
        }
    }

    let inbound = match Inbound::parse(&body) {
        Ok(inbound) => inbound,
        Err(response) => return (StatusCode::BAD_REQUEST, Json(response)).into_response(),
    };

    match state.server.handle(inbound).await.to_json() {
        Some(body) => (StatusCode::OK, Json(body)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn server_identity(State(state): State<AppState>) -> impl IntoResponse {
    let info = state.server.handler().server_info();
    Json(json!({
        "name": info.name,
        "version": info.version,
        "description": info.description,
        "protocol": "MCP Streamable HTTP",
        "protocolVersion": PROTOCOL_VERSION,
    }))
}

async fn health(State(state): State<AppState>) -> Response {
    match state.server.handler().client().stats().await {
        Ok(stats) => (StatusCode::OK, Json(json!({ "status": "ok", "data": stats }))).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
