//! The prompt handler: one request in, one upstream call, one response out

use axum::{
    body::Bytes,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use super::error::ProxyError;
use crate::api::{extract_text, GenerateContentRequest};
use crate::config::{AppConfig, StatsConfig, UpstreamConfig};
use crate::stats::{format_metrics, format_prompt_log, Outcome, RequestMetrics};

pub const METHOD_NOT_ALLOWED: &str = "Method Not Allowed";
pub const PROMPT_REQUIRED: &str = "Prompt is required.";
pub const UPSTREAM_FAILED: &str = "Failed to get response from Google AI.";
pub const UPSTREAM_UNPARSEABLE: &str = "Could not parse the response from Google AI.";

/// Transport-neutral inbound request. The body is kept as raw bytes until
/// the handler decodes it.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: String,
    pub body: Bytes,
}

impl IncomingRequest {
    pub fn new(method: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method: method.into(),
            body: body.into(),
        }
    }
}

/// Transport-neutral response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl OutgoingResponse {
    /// Bare body, no headers
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// JSON-encoded body with `Content-Type: application/json`
    pub fn json(status: u16, value: &Value) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: value.to_string(),
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl IntoResponse for OutgoingResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, self.body).into_response();

        for (name, value) in &self.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "Dropping invalid response header"),
            }
        }

        response
    }
}

/// Read-only settings the handler is constructed with
#[derive(Clone)]
pub struct ProxyConfig {
    pub api_key: Option<String>,
    /// generateContent URL without the key parameter
    pub endpoint: String,
    pub model: String,
    pub stats: StatsConfig,
}

impl ProxyConfig {
    pub fn new(upstream: &UpstreamConfig, api_key: Option<String>, stats: StatsConfig) -> Self {
        Self {
            api_key,
            endpoint: upstream.endpoint(),
            model: upstream.model.clone(),
            stats,
        }
    }

    /// Resolve the key from the environment/config once, at construction
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(&config.upstream, config.upstream.resolve_api_key(), config.stats.clone())
    }
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("stats", &self.stats)
            .finish()
    }
}

/// Stateless prompt handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PromptProxy {
    config: Arc<ProxyConfig>,
    http_client: reqwest::Client,
}

impl PromptProxy {
    pub fn new(config: ProxyConfig, http_client: reqwest::Client) -> Self {
        Self {
            config: Arc::new(config),
            http_client,
        }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve one invocation
    pub async fn handle(&self, request: IncomingRequest) -> OutgoingResponse {
        let start = Instant::now();
        let mut metrics = RequestMetrics::new(self.config.model.as_str());
        let span = tracing::info_span!("invocation", request_id = %metrics.request_id);

        let response = self.dispatch(request, &mut metrics).instrument(span.clone()).await;

        metrics.status = response.status;
        metrics.duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        if self.config.stats.enabled {
            span.in_scope(|| tracing::info!("{}", format_metrics(&metrics, self.config.stats.format)));
        }

        response
    }

    async fn dispatch(&self, request: IncomingRequest, metrics: &mut RequestMetrics) -> OutgoingResponse {
        tracing::debug!(method = %request.method, body_len = request.body.len(), "Processing request");

        if request.method != "POST" {
            metrics.outcome = Outcome::MethodNotAllowed;
            return OutgoingResponse::text(405, METHOD_NOT_ALLOWED);
        }

        match self.generate(&request.body, metrics).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Prompt proxy invocation failed");
                metrics.outcome = Outcome::InternalError;
                OutgoingResponse::text(500, json!({ "error": e.to_string() }).to_string())
            }
        }
    }

    async fn generate(&self, body: &[u8], metrics: &mut RequestMetrics) -> Result<OutgoingResponse, ProxyError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ProxyError::MissingApiKey)?;

        let Some(prompt) = parse_prompt(body)? else {
            metrics.outcome = Outcome::MissingPrompt;
            return Ok(OutgoingResponse::text(400, PROMPT_REQUIRED));
        };

        metrics.prompt_chars = prompt.chars().count();
        tracing::info!("{}", format_prompt_log(&self.config.model, &prompt));

        let payload = GenerateContentRequest::from_prompt(&prompt);

        tracing::debug!(upstream = %self.config.endpoint, "Calling upstream");
        let upstream_start = Instant::now();
        let upstream_response = self
            .http_client
            .post(&self.config.endpoint)
            .query(&[("key", api_key)])
            .header(header::CONTENT_TYPE, "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(ProxyError::upstream)?;

        let status = upstream_response.status();
        let body_text = upstream_response.text().await.map_err(ProxyError::upstream)?;
        metrics.upstream_status = Some(status.as_u16());
        metrics.upstream_ms = Some(upstream_start.elapsed().as_secs_f64() * 1000.0);

        if !status.is_success() {
            tracing::error!(
                status = %status,
                error_body = %body_text,
                "Upstream returned error response"
            );
            metrics.outcome = Outcome::UpstreamStatus;
            return Ok(OutgoingResponse::text(status.as_u16(), UPSTREAM_FAILED));
        }

        let result: Value = serde_json::from_str(&body_text).map_err(ProxyError::UpstreamBody)?;

        let Some(text) = extract_text(&result) else {
            tracing::error!(response = %result, "Invalid response structure from upstream");
            metrics.outcome = Outcome::UnparseableResponse;
            return Ok(OutgoingResponse::text(500, UPSTREAM_UNPARSEABLE));
        };

        metrics.response_chars = text.chars().count();
        metrics.outcome = Outcome::Success;
        Ok(OutgoingResponse::json(200, &json!({ "text": text })))
    }
}

/// Parse the request body and pull out a non-empty string `prompt`.
///
/// `Ok(None)` means the body was readable but carried no usable prompt.
fn parse_prompt(body: &[u8]) -> Result<Option<String>, ProxyError> {
    let body = std::str::from_utf8(body).map_err(ProxyError::InvalidEncoding)?;
    let value: Value = serde_json::from_str(body).map_err(ProxyError::InvalidBody)?;

    if value.is_null() {
        return Err(ProxyError::NullBody);
    }

    Ok(value
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty())
        .map(str::to_string))
}
