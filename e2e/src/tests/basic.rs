//! Happy-path behavior - prompt forwarding and text relay

use crate::backend::{drain_requests, queue_response};
use crate::client::send_prompt;
use crate::runner::TestContext;
use crate::types::MockResponse;

use super::helpers::*;

/// Prompt in, generated text out as `{"text": ...}`
pub async fn test_prompt_returns_text(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.upstream_state, MockResponse::json(upstream_text_response("hi there")));

    let resp = send_prompt(&ctx.http_client, &ctx.proxy_addr, "hello").await?;

    assert_status(resp.status, 200)?;
    assert_eq_str(&resp.body, r#"{"text":"hi there"}"#, "response body")?;
    assert_true(
        resp.content_type.as_deref() == Some("application/json"),
        &format!("Expected application/json, got {:?}", resp.content_type),
    )?;

    Ok(())
}

/// Upstream receives the generateContent payload, key parameter and JSON content type
pub async fn test_upstream_request_shape(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.upstream_state, MockResponse::json(upstream_text_response("ok")));

    send_prompt(&ctx.http_client, &ctx.proxy_addr, "Write a haiku").await?;

    let reqs = drain_requests(&ctx.upstream_state);
    assert_true(reqs.len() == 1, &format!("Expected 1 upstream request, got {}", reqs.len()))?;

    let req = &reqs[0];
    assert_eq_str(&req.path, "/v1beta/models/e2e-model:generateContent", "upstream path")?;
    assert_eq_str(req.query.as_deref().unwrap_or(""), "key=e2e-secret", "upstream query")?;
    assert_true(
        req.content_type.as_deref() == Some("application/json"),
        &format!("Upstream content type was {:?}", req.content_type),
    )?;

    let expected = serde_json::json!({"contents": [{"parts": [{"text": "Write a haiku"}]}]});
    assert_true(
        req.body == expected,
        &format!("Unexpected upstream payload: {}", req.body),
    )?;

    Ok(())
}

/// Unicode and multi-line prompts survive the round trip
pub async fn test_unicode_prompt(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.upstream_state, MockResponse::json(upstream_text_response("Xin chào! 👋")));

    let prompt = "Chào bạn\nhãy viết một câu";
    let resp = send_prompt(&ctx.http_client, &ctx.proxy_addr, prompt).await?;

    assert_status(resp.status, 200)?;
    let body = resp.json()?;
    assert_eq_str(body["text"].as_str().unwrap_or(""), "Xin chào! 👋", "text")?;

    let reqs = drain_requests(&ctx.upstream_state);
    let sent = reqs
        .first()
        .and_then(|r| r.body.pointer("/contents/0/parts/0/text"))
        .and_then(|t| t.as_str())
        .unwrap_or("");
    assert_eq_str(sent, prompt, "forwarded prompt")?;

    Ok(())
}

/// Same input twice gives the same output
pub async fn test_repeatable(ctx: TestContext) -> anyhow::Result<()> {
    queue_response(&ctx.upstream_state, MockResponse::json(upstream_text_response("same")));
    queue_response(&ctx.upstream_state, MockResponse::json(upstream_text_response("same")));

    let first = send_prompt(&ctx.http_client, &ctx.proxy_addr, "again").await?;
    let second = send_prompt(&ctx.http_client, &ctx.proxy_addr, "again").await?;

    assert_status(first.status, second.status)?;
    assert_eq_str(&second.body, &first.body, "second body")?;

    Ok(())
}
