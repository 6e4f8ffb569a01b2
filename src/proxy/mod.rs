//! Prompt handler and its HTTP hosting

mod error;
mod handler;
#[cfg(test)]
mod mock_upstream;
pub mod server;

pub use error::ProxyError;
pub use handler::{
    IncomingRequest, OutgoingResponse, PromptProxy, ProxyConfig, METHOD_NOT_ALLOWED, PROMPT_REQUIRED,
    UPSTREAM_FAILED, UPSTREAM_UNPARSEABLE,
};
pub use server::{build_proxy, build_router, run_server, ProxyState, FUNCTION_PATH};
