//! HTTP hosting for the prompt handler

use axum::{
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handler::{IncomingRequest, PromptProxy, ProxyConfig};
use crate::config::{AppConfig, UpstreamConfig};

/// Path the handler is mounted at, matching the serverless function route
pub const FUNCTION_PATH: &str = "/.netlify/functions/gemini-proxy";

/// Shared state for the server
#[derive(Clone)]
pub struct ProxyState {
    pub config: Arc<AppConfig>,
    pub proxy: PromptProxy,
}

/// Build the upstream HTTP client
pub fn build_http_client(config: &UpstreamConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut client_builder = reqwest::Client::builder().pool_max_idle_per_host(10);

    if let Some(secs) = config.timeout_seconds {
        client_builder = client_builder.timeout(Duration::from_secs(secs));
    }

    client_builder.build()
}

/// Build the handler from application config, resolving the API key once
pub fn build_proxy(config: &AppConfig) -> Result<PromptProxy, reqwest::Error> {
    let http_client = build_http_client(&config.upstream)?;
    Ok(PromptProxy::new(ProxyConfig::from_app_config(config), http_client))
}

/// No CORS layer. Preflight OPTIONS must reach the handler and get its 405.
pub fn build_router(state: ProxyState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(FUNCTION_PATH, any(function_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Run the server
pub async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let proxy = build_proxy(&config)?;

    if proxy.config().api_key.is_none() {
        tracing::warn!(
            env = %config.upstream.api_key_env,
            "No API key configured; every prompt will fail with 500"
        );
    }

    let state = ProxyState {
        config: Arc::new(config.clone()),
        proxy,
    };

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("prompt-proxy listening on {}{}", addr, FUNCTION_PATH);
    tracing::info!("Forwarding to {}", config.upstream.endpoint());

    Ok(axum::serve(listener, app).await?)
}

/// Health check endpoint
async fn health_handler(State(state): State<ProxyState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.config.upstream.model,
        "api_key_configured": state.proxy.config().api_key.is_some(),
    }))
}

/// Adapt an axum request to the handler and back. The body is passed as raw
/// bytes; UTF-8 is checked by the handler after the method check.
async fn function_handler(State(state): State<ProxyState>, method: Method, body: Bytes) -> Response {
    let request = IncomingRequest::new(method.as_str(), body);
    state.proxy.handle(request).await.into_response()
}
