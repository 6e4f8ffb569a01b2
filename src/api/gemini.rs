//! generateContent request body and response navigation

use serde::{Deserialize, Serialize};

/// Request body for `models/{model}:generateContent`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Part {
    pub text: String,
}

impl GenerateContentRequest {
    /// A single-turn request carrying one text part
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

/// Pull `candidates[0].content.parts[0].text` out of a response.
///
/// Any missing level, a non-string `text` or an empty string all yield `None`.
pub fn extract_text(response: &serde_json::Value) -> Option<&str> {
    response
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
        .filter(|t| !t.is_empty())
}
