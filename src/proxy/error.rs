//! Internal failures collapsed into a 500 at the handler boundary

/// Errors raised while serving one invocation.
///
/// The `Display` text of each variant is what the caller sees in the
/// `{"error": ...}` body, so none of them may carry the API key.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("API key is not configured.")]
    MissingApiKey,

    #[error("Request body is not valid UTF-8: {0}")]
    InvalidEncoding(#[source] std::str::Utf8Error),

    #[error("Invalid JSON in request body: {0}")]
    InvalidBody(#[source] serde_json::Error),

    #[error("Request body is null, cannot read 'prompt'")]
    NullBody,

    /// Built from errors with the URL stripped, the URL carries the key
    #[error("Request to upstream failed: {0}")]
    Upstream(#[source] reqwest::Error),

    #[error("Upstream returned invalid JSON: {0}")]
    UpstreamBody(#[source] serde_json::Error),
}

impl ProxyError {
    pub(crate) fn upstream(err: reqwest::Error) -> Self {
        ProxyError::Upstream(err.without_url())
    }
}
