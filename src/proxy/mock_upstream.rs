//! In-process mock of the generateContent endpoint for handler and router tests
//!
//! Tests queue responses before invoking the proxy; the mock pops one per
//! request and records what it received.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// A response the mock serves for the next request
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn error(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A request received by the mock
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: serde_json::Value,
}

#[derive(Debug, Default)]
struct MockState {
    response_queue: VecDeque<MockResponse>,
    /// Served whenever the queue is empty
    sticky: Option<MockResponse>,
    received_requests: Vec<ReceivedRequest>,
}

type SharedMockState = Arc<Mutex<MockState>>;

pub struct MockUpstream {
    pub base_url: String,
    state: SharedMockState,
}

impl MockUpstream {
    /// Bind an ephemeral port on localhost and serve in the background
    pub async fn start() -> Self {
        let state: SharedMockState = Arc::new(Mutex::new(MockState::default()));

        let app = Router::new()
            .route("/v1beta/*rest", post(handle_generate))
            .with_state(state.clone());

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
            .await
            .expect("bind mock upstream");
        let addr = listener.local_addr().expect("mock upstream addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock upstream server failed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn queue(&self, response: MockResponse) {
        self.state.lock().unwrap().response_queue.push_back(response);
    }

    /// Serve `response` for every request once the queue is drained
    pub fn always(&self, response: MockResponse) {
        self.state.lock().unwrap().sticky = Some(response);
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.state.lock().unwrap().received_requests.clone()
    }
}

async fn handle_generate(
    State(state): State<SharedMockState>,
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

    let mock_response = {
        let mut state = state.lock().unwrap();
        state.received_requests.push(received);
        let queued = state.response_queue.pop_front();
        queued
            .or_else(|| state.sticky.clone())
            .unwrap_or_else(|| MockResponse::error(500, r#"{"error":"no mock queued"}"#))
    };

    (
        StatusCode::from_u16(mock_response.status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        mock_response.body,
    )
        .into_response()
}
