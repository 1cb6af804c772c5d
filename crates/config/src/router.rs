//! AI router and provider configuration
//!
//! Read once when the router is built; never re-validated per call.

use serde::{Deserialize, Serialize};

use sari_sari_core::ProviderKind;

use crate::ConfigError;

/// Provider selection policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreferredProvider {
    Cloud,
    Local,
    /// Local when available, otherwise cloud gated by cost/latency thresholds
    #[default]
    Auto,
}

impl PreferredProvider {
    /// The provider kind this policy names, if any
    pub fn kind(&self) -> Option<ProviderKind> {
        match self {
            PreferredProvider::Cloud => Some(ProviderKind::Cloud),
            PreferredProvider::Local => Some(ProviderKind::Local),
            PreferredProvider::Auto => None,
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default)]
    pub preferred_provider: PreferredProvider,

    /// Provider to use when the preferred one is unavailable
    #[serde(default)]
    pub fallback_provider: Option<ProviderKind>,

    /// Maximum acceptable cloud cost per request (USD), auto mode only
    #[serde(default)]
    pub cost_threshold: Option<f64>,

    /// Maximum acceptable cloud latency (ms), auto mode only
    #[serde(default)]
    pub latency_threshold: Option<f64>,

    #[serde(default = "default_cloud_provider")]
    pub cloud_provider: Option<CloudProviderConfig>,

    #[serde(default = "default_local_provider")]
    pub local_provider: Option<LocalProviderConfig>,
}

fn default_cloud_provider() -> Option<CloudProviderConfig> {
    Some(CloudProviderConfig::default())
}

fn default_local_provider() -> Option<LocalProviderConfig> {
    Some(LocalProviderConfig::default())
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            preferred_provider: PreferredProvider::default(),
            fallback_provider: None,
            cost_threshold: None,
            latency_threshold: None,
            cloud_provider: default_cloud_provider(),
            local_provider: default_local_provider(),
        }
    }
}

impl RouterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("router.cost_threshold", self.cost_threshold),
            ("router.latency_threshold", self.latency_threshold),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v < 0.0 {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        message: format!("Must be a non-negative number, got {}", v),
                    });
                }
            }
        }

        if let Some(cloud) = &self.cloud_provider {
            cloud.validate()?;
        }
        if let Some(local) = &self.local_provider {
            local.validate()?;
        }

        Ok(())
    }
}

/// Hosted LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudProviderConfig {
    /// Backend identifier, e.g. "anthropic"
    #[serde(default = "default_cloud_backend")]
    pub provider: String,

    /// Deployment region, recorded for logging
    #[serde(default)]
    pub region: Option<String>,

    /// Model alias or full model ID
    #[serde(default = "default_cloud_model")]
    pub model: String,

    #[serde(default)]
    pub max_tokens: Option<usize>,

    #[serde(default)]
    pub temperature: Option<f32>,

    /// API key; falls back to ANTHROPIC_API_KEY when unset
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL override (proxies, testing)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Overrides the model's documented per-request cost
    #[serde(default)]
    pub cost_per_request: Option<f64>,

    /// Overrides the model's latency estimate
    #[serde(default)]
    pub latency_estimate_ms: Option<f64>,

    #[serde(default = "default_cloud_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cloud_backend() -> String {
    "anthropic".to_string()
}
fn default_cloud_model() -> String {
    "haiku".to_string()
}
fn default_cloud_timeout_ms() -> u64 {
    30_000
}

impl Default for CloudProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_cloud_backend(),
            region: None,
            model: default_cloud_model(),
            max_tokens: None,
            temperature: None,
            api_key: None,
            endpoint: None,
            cost_per_request: None,
            latency_estimate_ms: None,
            timeout_ms: default_cloud_timeout_ms(),
        }
    }
}

impl CloudProviderConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField("router.cloud_provider.model".to_string()));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(ConfigError::InvalidValue {
                    field: "router.cloud_provider.temperature".to_string(),
                    message: format!("Must be between 0.0 and 1.0, got {}", t),
                });
            }
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "router.cloud_provider.max_tokens".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "router.cloud_provider.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Additional local inference endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub url: String,
}

/// Local inference runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalProviderConfig {
    /// Runtime identifier, e.g. "ollama"
    #[serde(default = "default_local_backend")]
    pub provider: String,

    /// Primary endpoint URL
    #[serde(default = "default_local_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_local_model")]
    pub model: String,

    #[serde(default)]
    pub max_tokens: Option<usize>,

    #[serde(default)]
    pub temperature: Option<f32>,

    /// Secondary endpoints, tried in order when the primary is unhealthy
    #[serde(default)]
    pub additional_endpoints: Vec<EndpointConfig>,

    #[serde(default = "default_local_timeout_ms")]
    pub timeout_ms: u64,

    /// How long the runtime keeps the model loaded between calls
    #[serde(default = "default_keep_alive")]
    pub keep_alive: String,

    /// Transport retries inside the backend; the router itself never retries
    #[serde(default)]
    pub max_retries: u32,

    /// Latency estimate reported to the router (ms)
    #[serde(default = "default_local_latency_ms")]
    pub latency_estimate_ms: f64,
}

fn default_local_backend() -> String {
    "ollama".to_string()
}
fn default_local_endpoint() -> String {
    "http://localhost:11434".to_string()
}
fn default_local_model() -> String {
    "llama3.2:3b".to_string()
}
fn default_local_timeout_ms() -> u64 {
    20_000
}
fn default_keep_alive() -> String {
    "5m".to_string()
}
fn default_local_latency_ms() -> f64 {
    400.0
}

impl Default for LocalProviderConfig {
    fn default() -> Self {
        Self {
            provider: default_local_backend(),
            endpoint: default_local_endpoint(),
            model: default_local_model(),
            max_tokens: None,
            temperature: None,
            additional_endpoints: Vec::new(),
            timeout_ms: default_local_timeout_ms(),
            keep_alive: default_keep_alive(),
            max_retries: 0,
            latency_estimate_ms: default_local_latency_ms(),
        }
    }
}

impl LocalProviderConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::MissingField("router.local_provider.endpoint".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField("router.local_provider.model".to_string()));
        }
        if let Some(t) = self.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::InvalidValue {
                    field: "router.local_provider.temperature".to_string(),
                    message: format!("Must be between 0.0 and 2.0, got {}", t),
                });
            }
        }
        if self.max_tokens == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "router.local_provider.max_tokens".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "router.local_provider.timeout_ms".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }
        for endpoint in &self.additional_endpoints {
            if endpoint.name == "primary" {
                return Err(ConfigError::InvalidValue {
                    field: "router.local_provider.additional_endpoints".to_string(),
                    message: "\"primary\" is reserved for the main endpoint".to_string(),
                });
            }
        }
        Ok(())
    }
}
