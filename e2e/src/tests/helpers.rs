//! Common test helpers and JSON builders

use serde_json::json;

// ─── Upstream response builders ───────────────────────────────────────────────

/// A normal generateContent response carrying `text`
pub fn upstream_text_response(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {
                "parts": [{"text": text}],
                "role": "model"
            },
            "finishReason": "STOP",
            "index": 0
        }],
        "usageMetadata": {
            "promptTokenCount": 4,
            "candidatesTokenCount": 3,
            "totalTokenCount": 7
        }
    })
    .to_string()
}

/// A response where the prompt was blocked and no candidates came back
pub fn upstream_blocked_response() -> String {
    json!({
        "promptFeedback": {"blockReason": "SAFETY"},
        "usageMetadata": {"promptTokenCount": 4, "totalTokenCount": 4}
    })
    .to_string()
}

/// Google-style API error body
pub fn upstream_error_body(code: u16, status: &str, message: &str) -> String {
    json!({
        "error": {"code": code, "message": message, "status": status}
    })
    .to_string()
}

// ─── Assertions ───────────────────────────────────────────────────────────────

/// Assert two strings are equal, with context on failure
pub fn assert_eq_str(actual: &str, expected: &str, label: &str) -> anyhow::Result<()> {
    if actual != expected {
        Err(anyhow::anyhow!("{label}: expected {:?} but got {:?}", expected, actual))
    } else {
        Ok(())
    }
}

/// Assert condition is true, with message
pub fn assert_true(cond: bool, msg: &str) -> anyhow::Result<()> {
    if !cond {
        Err(anyhow::anyhow!("{}", msg))
    } else {
        Ok(())
    }
}

/// Assert status code equality
pub fn assert_status(actual: u16, expected: u16) -> anyhow::Result<()> {
    assert_true(actual == expected, &format!("Expected status {}, got {}", expected, actual))
}
