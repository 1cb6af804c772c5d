//! Provider factory
//!
//! Builds provider adapters from the router configuration. Construction
//! errors are handed back per provider so the router can register the
//! provider as unavailable instead of failing startup.
//!
//! ## Supported backends
//! - **Anthropic** (cloud): Claude Messages API
//! - **Ollama** (local): `/api/chat`, one or more hosts

use std::sync::Arc;

use sari_sari_config::{CloudProviderConfig, LocalProviderConfig, RouterConfig};
use sari_sari_core::ProviderKind;

use crate::adapter::NlpProvider;
use crate::cloud::CloudProvider;
use crate::local::LocalProvider;
use crate::LlmError;

/// Inference backend named by a provider config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Anthropic,
    Ollama,
}

impl BackendKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "anthropic" | "claude" => Some(BackendKind::Anthropic),
            "ollama" => Some(BackendKind::Ollama),
            _ => None,
        }
    }

    /// Provider kind this backend serves
    pub fn provider_kind(&self) -> ProviderKind {
        match self {
            BackendKind::Anthropic => ProviderKind::Cloud,
            BackendKind::Ollama => ProviderKind::Local,
        }
    }
}

fn backend_for(name: &str, expected: ProviderKind) -> Result<BackendKind, LlmError> {
    match BackendKind::from_str(name) {
        Some(kind) if kind.provider_kind() == expected => Ok(kind),
        Some(_) => Err(LlmError::Configuration(format!(
            "backend '{}' cannot serve the {} provider",
            name, expected
        ))),
        None => Err(LlmError::Configuration(format!("unsupported backend '{}'", name))),
    }
}

/// Factory for provider adapters
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_cloud(config: &CloudProviderConfig) -> Result<Arc<dyn NlpProvider>, LlmError> {
        match backend_for(&config.provider, ProviderKind::Cloud)? {
            BackendKind::Anthropic => Ok(Arc::new(CloudProvider::new(config)?)),
            BackendKind::Ollama => unreachable!("rejected by backend_for"),
        }
    }

    pub fn create_local(config: &LocalProviderConfig) -> Result<Arc<dyn NlpProvider>, LlmError> {
        match backend_for(&config.provider, ProviderKind::Local)? {
            BackendKind::Ollama => Ok(Arc::new(LocalProvider::new(config)?)),
            BackendKind::Anthropic => unreachable!("rejected by backend_for"),
        }
    }

    /// Build every configured provider, cloud first
    pub fn from_router_config(
        config: &RouterConfig,
    ) -> Vec<(ProviderKind, Result<Arc<dyn NlpProvider>, LlmError>)> {
        let mut providers = Vec::new();
        if let Some(cloud) = &config.cloud_provider {
            providers.push((ProviderKind::Cloud, Self::create_cloud(cloud)));
        }
        if let Some(local) = &config.local_provider {
            providers.push((ProviderKind::Local, Self::create_local(local)));
        }
        providers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!(BackendKind::from_str("Anthropic"), Some(BackendKind::Anthropic));
        assert_eq!(BackendKind::from_str("claude"), Some(BackendKind::Anthropic));
        assert_eq!(BackendKind::from_str("ollama"), Some(BackendKind::Ollama));
        assert_eq!(BackendKind::from_str("bedrock"), None);
    }

    #[test]
    fn test_mismatched_backend_rejected() {
        let cloud = CloudProviderConfig {
            provider: "ollama".to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ProviderFactory::create_cloud(&cloud),
            Err(LlmError::Configuration(_))
        ));

        let local = LocalProviderConfig {
            provider: "vllm".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ProviderFactory::create_local(&local),
            Err(LlmError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_router_config() {
        let config = RouterConfig {
            cloud_provider: Some(CloudProviderConfig {
                api_key: Some("sk-test".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let providers = ProviderFactory::from_router_config(&config);
        assert_eq!(providers.len(), 2);
        assert_eq!(providers[0].0, ProviderKind::Cloud);
        assert!(providers[0].1.is_ok());
        assert_eq!(providers[1].0, ProviderKind::Local);
        assert!(providers[1].1.is_ok());
    }

    #[test]
    fn test_only_configured_providers_built() {
        let config = RouterConfig {
            cloud_provider: None,
            ..Default::default()
        };
        let providers = ProviderFactory::from_router_config(&config);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].0, ProviderKind::Local);
    }
}
