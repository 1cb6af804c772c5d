//! Claude Backend
//!
//! Implements the Anthropic Messages API for the hosted provider.
//! The system prompt is split out of the message list as the API requires.

use std::time::Duration;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use sari_sari_config::CloudProviderConfig;

use crate::prompt::{Message, Role};
use crate::backend::{LlmBackend, GenerationResult, FinishReason};
use crate::LlmError;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Claude model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaudeModel {
    /// Claude Opus 4.5 - Most capable, slowest and most expensive
    Opus4_5,
    /// Claude Sonnet 4 - Fast and capable
    Sonnet4,
    /// Claude Haiku 3.5 - Fastest, enough for classification
    Haiku3_5,
}

impl ClaudeModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            ClaudeModel::Opus4_5 => "claude-opus-4-5-20251101",
            ClaudeModel::Sonnet4 => "claude-sonnet-4-20250514",
            ClaudeModel::Haiku3_5 => "claude-3-5-haiku-20241022",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "opus" | "opus-4.5" | "claude-opus-4-5-20251101" => Some(ClaudeModel::Opus4_5),
            "sonnet" | "sonnet-4" | "claude-sonnet-4-20250514" => Some(ClaudeModel::Sonnet4),
            "haiku" | "haiku-3.5" | "claude-3-5-haiku-20241022" => Some(ClaudeModel::Haiku3_5),
            _ => None,
        }
    }

    /// Estimated USD cost of one short request (~600 input / ~150 output tokens)
    pub fn cost_per_request(&self) -> f64 {
        match self {
            ClaudeModel::Opus4_5 => 0.03,
            ClaudeModel::Sonnet4 => 0.006,
            ClaudeModel::Haiku3_5 => 0.0008,
        }
    }

    /// Typical end-to-end latency of one short request (ms)
    pub fn latency_estimate_ms(&self) -> f64 {
        match self {
            ClaudeModel::Opus4_5 => 2500.0,
            ClaudeModel::Sonnet4 => 1200.0,
            ClaudeModel::Haiku3_5 => 600.0,
        }
    }
}

impl Default for ClaudeModel {
    fn default() -> Self {
        ClaudeModel::Haiku3_5
    }
}

/// Configuration for Claude backend
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    /// API key (from ANTHROPIC_API_KEY or direct)
    pub api_key: String,
    /// Model to use
    pub model: ClaudeModel,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Temperature (0.0 - 1.0)
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// API endpoint (for testing or proxy)
    pub endpoint: String,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("ANTHROPIC_API_KEY").unwrap_or_default(),
            model: ClaudeModel::default(),
            max_tokens: 512,
            temperature: 0.3,
            timeout: Duration::from_secs(30),
            endpoint: "https://api.anthropic.com".to_string(),
        }
    }
}

impl ClaudeConfig {
    /// Create config with API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Build from the cloud provider section of the router config
    pub fn from_cloud(config: &CloudProviderConfig) -> Result<Self, LlmError> {
        let model = ClaudeModel::from_str(&config.model)
            .ok_or_else(|| LlmError::ModelNotFound(config.model.clone()))?;

        let mut claude = match &config.api_key {
            Some(key) if !key.is_empty() => Self::new(key.clone()),
            _ => Self::default(),
        };
        claude.model = model;
        claude.timeout = Duration::from_millis(config.timeout_ms);
        if let Some(max_tokens) = config.max_tokens {
            claude.max_tokens = max_tokens;
        }
        if let Some(temperature) = config.temperature {
            claude = claude.with_temperature(temperature);
        }
        if let Some(endpoint) = &config.endpoint {
            claude.endpoint = endpoint.trim_end_matches('/').to_string();
        }
        Ok(claude)
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 1.0);
        self
    }
}

/// Claude backend
pub struct ClaudeBackend {
    config: ClaudeConfig,
    client: Client,
}

impl ClaudeBackend {
    /// Create a new Claude backend
    pub fn new(config: ClaudeConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() {
            return Err(LlmError::Configuration(
                "ANTHROPIC_API_KEY not set. Set it via environment or config.".to_string()
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn build_request(&self, messages: &[Message]) -> ClaudeRequest {
        let system = messages.iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        ClaudeRequest {
            model: self.config.model.model_id().to_string(),
            max_tokens: self.config.max_tokens,
            messages: convert_messages(messages),
            system: if system.is_empty() { None } else { Some(system) },
            temperature: Some(self.config.temperature),
        }
    }
}

/// Convert messages to Claude format, dropping system messages
fn convert_messages(messages: &[Message]) -> Vec<ClaudeMessage> {
    messages.iter()
        .filter_map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => return None,
            };
            Some(ClaudeMessage {
                role: role.to_string(),
                content: m.content.clone(),
            })
        })
        .collect()
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        let start = std::time::Instant::now();
        let request = self.build_request(messages);

        let response = self.client
            .post(format!("{}/v1/messages", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ClaudeErrorEnvelope>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            if status.is_server_error() || status.as_u16() == 529 || status.as_u16() == 429 {
                return Err(LlmError::Network(format!("HTTP {}: {}", status, detail)));
            }
            return Err(LlmError::Api(format!("HTTP {}: {}", status, detail)));
        }

        let response: ClaudeApiResponse = response.json().await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let text = response.content.iter()
            .filter_map(|block| match block {
                ClaudeContentBlock::Text { text } => Some(text.as_str()),
                ClaudeContentBlock::Other => None,
            })
            .collect::<String>();

        Ok(GenerationResult {
            text,
            tokens: response.usage.output_tokens,
            total_time_ms: start.elapsed().as_millis() as u64,
            finish_reason: match response.stop_reason {
                Some(ClaudeStopReason::MaxTokens) => FinishReason::Length,
                Some(_) => FinishReason::Stop,
                None => FinishReason::Error,
            },
        })
    }

    /// Key present and the models endpoint answers
    async fn is_available(&self) -> bool {
        if self.config.api_key.is_empty() {
            return false;
        }

        self.client
            .get(format!("{}/v1/models", self.config.endpoint))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    fn model_name(&self) -> &str {
        self.config.model.model_id()
    }
}

// =============================================================================
// Claude API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: usize,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ClaudeStopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContentBlock>,
    #[serde(default)]
    stop_reason: Option<ClaudeStopReason>,
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    #[allow(dead_code)]
    input_tokens: usize,
    output_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorEnvelope {
    error: ClaudeError,
}

#[derive(Debug, Deserialize)]
struct ClaudeError {
    message: String,
}
