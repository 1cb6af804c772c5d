//! LLM integration and provider adapters
//!
//! Features:
//! - Backends: Claude (hosted) and Ollama (local inference)
//! - `NlpProvider` capability interface for intent, entities and replies
//! - Cloud and local adapters with cost/latency estimates
//! - Multi-endpoint pool for local inference
//! - Prompt construction and tolerant JSON reply parsing

pub mod adapter;
pub mod backend;
pub mod claude;
pub mod cloud;
pub mod endpoints;
pub mod factory;
pub mod local;
pub mod parse;
pub mod prompt;

pub use adapter::NlpProvider;
pub use backend::{FinishReason, GenerationResult, LlmBackend, LlmConfig, OllamaBackend};
pub use claude::{ClaudeBackend, ClaudeConfig, ClaudeModel};
pub use cloud::CloudProvider;
pub use endpoints::{EndpointPool, EndpointStatus, PRIMARY_ENDPOINT};
pub use factory::{BackendKind, ProviderFactory};
pub use local::LocalProvider;
pub use prompt::{Message, Role};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout")]
    Timeout,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Endpoint error: {0}")]
    Endpoint(String),
}

impl LlmError {
    /// Transient failures worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Network(_) | LlmError::Timeout)
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_decode() {
            LlmError::InvalidResponse(err.to_string())
        } else {
            LlmError::Network(err.to_string())
        }
    }
}
