//! Self-hosted inference adapter
//!
//! Wraps an `EndpointPool` of Ollama hosts. Local inference has no marginal
//! cost, so the cost estimate is always zero. A transport failure marks the
//! endpoint unhealthy; the next call moves on to the next healthy endpoint.

use std::sync::Arc;

use async_trait::async_trait;

use sari_sari_config::LocalProviderConfig;
use sari_sari_core::{
    BusinessContext, ConversationContext, EntityExtraction, GeneratedResponse, Intent,
    IntentClassification, Outcome, ProviderKind,
};

use crate::adapter::{classify_with, extract_with, respond_with, NlpProvider};
use crate::backend::{LlmBackend, LlmConfig, OllamaBackend};
use crate::endpoints::{EndpointPool, EndpointStatus};
use crate::LlmError;

/// Default usage key of the local provider
pub const LOCAL_PROVIDER_NAME: &str = "local";

pub struct LocalProvider {
    name: String,
    pool: EndpointPool,
    /// Template for backends created by `add_endpoint`
    base: LlmConfig,
    latency_estimate_ms: f64,
}

impl LocalProvider {
    pub fn new(config: &LocalProviderConfig) -> Result<Self, LlmError> {
        let base = LlmConfig::from_local(config);
        let primary = OllamaBackend::new(base.clone())?;
        let provider = Self {
            name: LOCAL_PROVIDER_NAME.to_string(),
            pool: EndpointPool::new(base.endpoint.clone(), Arc::new(primary)),
            base,
            latency_estimate_ms: config.latency_estimate_ms,
        };

        for extra in &config.additional_endpoints {
            provider.add_endpoint(&extra.name, &extra.url)?;
        }
        tracing::info!(
            model = %provider.base.model,
            endpoints = provider.pool.len(),
            "Local provider configured"
        );
        Ok(provider)
    }

    /// Wrap an arbitrary backend as the primary endpoint
    pub fn with_backend(
        name: impl Into<String>,
        url: impl Into<String>,
        backend: Arc<dyn LlmBackend>,
        latency_estimate_ms: f64,
    ) -> Self {
        let url = url.into();
        Self {
            name: name.into(),
            base: LlmConfig::default().with_endpoint(url.clone()),
            pool: EndpointPool::new(url, backend),
            latency_estimate_ms,
        }
    }

    /// Register another Ollama host with the primary's model settings
    pub fn add_endpoint(&self, name: &str, url: &str) -> Result<(), LlmError> {
        let config = self.base.with_endpoint(url);
        let backend = OllamaBackend::new(config)?;
        self.pool.add(name, url, Arc::new(backend))?;
        tracing::info!(endpoint = name, url, "Added local endpoint");
        Ok(())
    }

    /// Register an arbitrary backend as a secondary endpoint
    pub fn add_backend(
        &self,
        name: &str,
        url: &str,
        backend: Arc<dyn LlmBackend>,
    ) -> Result<(), LlmError> {
        self.pool.add(name, url, backend)
    }

    pub fn remove_endpoint(&self, name: &str) -> Result<(), LlmError> {
        self.pool.remove(name)?;
        tracing::info!(endpoint = name, "Removed local endpoint");
        Ok(())
    }

    pub fn endpoint_status(&self) -> Vec<EndpointStatus> {
        self.pool.status()
    }

    fn select(&self) -> Result<(String, Arc<dyn LlmBackend>), LlmError> {
        self.pool
            .select()
            .ok_or_else(|| LlmError::Endpoint("no healthy local endpoint".to_string()))
    }

    /// Mark the endpoint unhealthy on transport failure
    fn observe<T>(&self, endpoint: &str, result: Result<T, LlmError>) -> Result<T, LlmError> {
        if let Err(e) = &result {
            if e.is_retryable() {
                tracing::warn!(endpoint, error = %e, "Local endpoint failed");
                self.pool.mark(endpoint, false);
            }
        }
        result
    }
}

#[async_trait]
impl NlpProvider for LocalProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Local
    }

    async fn classify_intent(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Result<Outcome<IntentClassification>, LlmError> {
        let (endpoint, backend) = self.select()?;
        let result = classify_with(backend.as_ref(), &self.name, message, context).await;
        self.observe(&endpoint, result)
    }

    async fn extract_entities(&self, message: &str) -> Result<Outcome<EntityExtraction>, LlmError> {
        let (endpoint, backend) = self.select()?;
        let result = extract_with(backend.as_ref(), &self.name, message).await;
        self.observe(&endpoint, result)
    }

    async fn generate_response(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        original_message: Option<&str>,
    ) -> Result<Outcome<GeneratedResponse>, LlmError> {
        let (endpoint, backend) = self.select()?;
        let result = respond_with(backend.as_ref(), &self.name, intent, business, original_message).await;
        self.observe(&endpoint, result)
    }

    /// Probes every endpoint; true if any is healthy
    async fn test_connection(&self) -> bool {
        let healthy = self.pool.probe_all().await;
        if !healthy {
            tracing::warn!(provider = %self.name, "No local endpoint reachable");
        }
        healthy
    }

    fn estimated_cost_per_request(&self) -> f64 {
        0.0
    }

    fn estimated_latency_ms(&self) -> f64 {
        self.latency_estimate_ms
    }
}
