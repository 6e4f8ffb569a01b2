//! Metrics collected over one handler invocation

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// How an invocation ended
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    MethodNotAllowed,
    MissingPrompt,
    UpstreamStatus,
    UnparseableResponse,
    InternalError,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::MethodNotAllowed => "method_not_allowed",
            Outcome::MissingPrompt => "missing_prompt",
            Outcome::UpstreamStatus => "upstream_status",
            Outcome::UnparseableResponse => "unparseable_response",
            Outcome::InternalError => "internal_error",
        }
    }
}

/// Collected metrics from a request/response cycle
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    /// Unique request ID
    pub request_id: String,
    /// Timestamp of the request
    pub timestamp: DateTime<Utc>,
    /// Model name
    pub model: String,
    pub outcome: Outcome,
    /// Status returned to the caller
    pub status: u16,
    /// Status returned by the upstream, when it was reached
    pub upstream_status: Option<u16>,
    /// Prompt length in characters
    pub prompt_chars: usize,
    /// Generated text length in characters
    pub response_chars: usize,
    /// Time spent waiting on the upstream in ms
    pub upstream_ms: Option<f64>,
    /// Request duration in ms
    pub duration_ms: f64,
}

impl RequestMetrics {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            model: model.into(),
            outcome: Outcome::InternalError,
            status: 500,
            upstream_status: None,
            prompt_chars: 0,
            response_chars: 0,
            upstream_ms: None,
            duration_ms: 0.0,
        }
    }
}
