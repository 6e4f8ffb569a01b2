//! Mock upstream server that simulates the generateContent endpoint
//!
//! Tests pre-configure responses via SharedUpstreamState before each request.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::types::{MockResponse, ReceivedRequest, SharedUpstreamState, UpstreamState};

/// Default fallback response when no response is queued
fn default_generate_response() -> MockResponse {
    MockResponse::json(
        r#"{"candidates":[{"content":{"parts":[{"text":"Default response (no mock queued)"}],"role":"model"},"finishReason":"STOP","index":0}]}"#,
    )
}

/// Handle POST /v1beta/models/{model}:generateContent - serves pre-configured mock responses
async fn handle_generate(
    State(state): State<SharedUpstreamState>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let received = ReceivedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };

    // Pop the next configured response (or use default)
    let mock_response = {
        let mut state = state.lock().unwrap();
        state.received_requests.push(received);
        state.calls += 1;
        state.response_queue.pop_front().unwrap_or_else(default_generate_response)
    };

    Response::builder()
        .status(mock_response.status)
        .header("Content-Type", &mock_response.content_type)
        .body(Body::from(mock_response.body))
        .unwrap()
        .into_response()
}

/// Start the mock upstream server and return the shared state handle
pub async fn start(port: u16) -> anyhow::Result<SharedUpstreamState> {
    let state: SharedUpstreamState = std::sync::Arc::new(std::sync::Mutex::new(UpstreamState::default()));

    let app = Router::new()
        .route("/v1beta/*rest", post(handle_generate))
        .with_state(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind mock upstream to {}: {}", addr, e))?;

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock upstream server failed");
    });

    // Brief pause to let the server start accepting connections
    tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;

    Ok(state)
}

/// Helper to configure the next response for generateContent
pub fn queue_response(state: &SharedUpstreamState, response: MockResponse) {
    state.lock().unwrap().response_queue.push_back(response);
}

/// Helper to get all requests received since last clear
pub fn drain_requests(state: &SharedUpstreamState) -> Vec<ReceivedRequest> {
    let mut s = state.lock().unwrap();
    s.received_requests.drain(..).collect()
}

/// Clear queued responses, recorded requests and the call counter
pub fn reset(state: &SharedUpstreamState) {
    *state.lock().unwrap() = UpstreamState::default();
}

/// generateContent calls since the last reset
pub fn call_count(state: &SharedUpstreamState) -> usize {
    state.lock().unwrap().calls
}
