//! prompt-proxy: forwards prompts to the Gemini generateContent API
//!
//! Features:
//! - Single stateless handler with a server-side API key
//! - Serverless-style function route hosted on axum
//! - Per-request stats logging

pub mod api;
pub mod config;
pub mod proxy;
pub mod stats;

pub use config::AppConfig;
pub use proxy::{run_server, IncomingRequest, OutgoingResponse, PromptProxy};
