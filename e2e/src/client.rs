//! HTTP client that simulates how a web page talks to the proxy function

use reqwest::{Client, Method};

use crate::types::ProxyResponse;

/// Function route on the proxy
pub const FUNCTION_PATH: &str = "/.netlify/functions/gemini-proxy";

/// Build an HTTP client
pub fn build_client() -> Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to build reqwest client")
}

/// POST a `{"prompt": ...}` body to the function
pub async fn send_prompt(client: &Client, proxy_addr: &str, prompt: &str) -> anyhow::Result<ProxyResponse> {
    send_raw(
        client,
        proxy_addr,
        Method::POST,
        serde_json::json!({ "prompt": prompt }).to_string(),
    )
    .await
}

/// Send an arbitrary method and body to the function
pub async fn send_raw(
    client: &Client,
    proxy_addr: &str,
    method: Method,
    body: impl Into<String>,
) -> anyhow::Result<ProxyResponse> {
    let url = format!("http://{proxy_addr}{FUNCTION_PATH}");

    let resp = client
        .request(method, &url)
        .header("Content-Type", "application/json")
        .body(body.into())
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to send request to proxy: {}", e))?;

    let status = resp.status().as_u16();
    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = resp
        .text()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read proxy response: {}", e))?;

    Ok(ProxyResponse {
        status,
        content_type,
        body,
    })
}
