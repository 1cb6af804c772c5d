//! Hosted LLM adapter

use std::sync::Arc;

use async_trait::async_trait;

use sari_sari_config::CloudProviderConfig;
use sari_sari_core::{
    BusinessContext, ConversationContext, EntityExtraction, GeneratedResponse, Intent,
    IntentClassification, Outcome, ProviderKind,
};

use crate::adapter::{classify_with, extract_with, respond_with, NlpProvider};
use crate::backend::LlmBackend;
use crate::claude::{ClaudeBackend, ClaudeConfig};
use crate::LlmError;

/// Default usage key of the hosted provider
pub const CLOUD_PROVIDER_NAME: &str = "cloud";

/// Adapter over a hosted, per-request billed backend
pub struct CloudProvider {
    name: String,
    backend: Arc<dyn LlmBackend>,
    cost_per_request: f64,
    latency_estimate_ms: f64,
    region: Option<String>,
}

impl CloudProvider {
    /// Build a Claude-backed provider. Fails without an API key.
    pub fn new(config: &CloudProviderConfig) -> Result<Self, LlmError> {
        let claude = ClaudeConfig::from_cloud(config)?;
        let model = claude.model;
        let backend = ClaudeBackend::new(claude)?;

        let provider = Self {
            name: CLOUD_PROVIDER_NAME.to_string(),
            backend: Arc::new(backend),
            cost_per_request: config.cost_per_request.unwrap_or_else(|| model.cost_per_request()),
            latency_estimate_ms: config
                .latency_estimate_ms
                .unwrap_or_else(|| model.latency_estimate_ms()),
            region: config.region.clone(),
        };
        tracing::info!(
            model = model.model_id(),
            region = provider.region.as_deref().unwrap_or("default"),
            cost_per_request = provider.cost_per_request,
            "Cloud provider configured"
        );
        Ok(provider)
    }

    /// Wrap an arbitrary backend
    pub fn with_backend(
        name: impl Into<String>,
        backend: Arc<dyn LlmBackend>,
        cost_per_request: f64,
        latency_estimate_ms: f64,
    ) -> Self {
        Self {
            name: name.into(),
            backend,
            cost_per_request,
            latency_estimate_ms,
            region: None,
        }
    }
}

#[async_trait]
impl NlpProvider for CloudProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Cloud
    }

    async fn classify_intent(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Result<Outcome<IntentClassification>, LlmError> {
        classify_with(self.backend.as_ref(), &self.name, message, context).await
    }

    async fn extract_entities(&self, message: &str) -> Result<Outcome<EntityExtraction>, LlmError> {
        extract_with(self.backend.as_ref(), &self.name, message).await
    }

    async fn generate_response(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        original_message: Option<&str>,
    ) -> Result<Outcome<GeneratedResponse>, LlmError> {
        respond_with(self.backend.as_ref(), &self.name, intent, business, original_message).await
    }

    async fn test_connection(&self) -> bool {
        let available = self.backend.is_available().await;
        if !available {
            tracing::warn!(provider = %self.name, "Cloud provider connection test failed");
        }
        available
    }

    fn estimated_cost_per_request(&self) -> f64 {
        self.cost_per_request
    }

    fn estimated_latency_ms(&self) -> f64 {
        self.latency_estimate_ms
    }
}
