//! Provider descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of inference backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Hosted LLM API, billed per request
    Cloud,
    /// Self-hosted inference runtime, zero marginal cost
    Local,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Cloud => "cloud",
            ProviderKind::Local => "local",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry entry recorded when a provider is probed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Provider name, used as the metrics usage key
    pub name: String,
    pub kind: ProviderKind,
    /// Result of the last availability probe
    pub available: bool,
    /// Estimated cost of one request (USD)
    pub cost_per_request: f64,
    /// Estimated latency of one request (ms)
    pub latency_estimate_ms: f64,
}

impl ProviderDescriptor {
    /// Descriptor for a provider that could not be constructed
    pub fn unavailable(name: impl Into<String>, kind: ProviderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            available: false,
            cost_per_request: 0.0,
            latency_estimate_ms: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_names() {
        assert_eq!(ProviderKind::Cloud.to_string(), "cloud");
        assert_eq!(ProviderKind::Local.as_str(), "local");
        assert_eq!(
            ProviderDescriptor::unavailable("local", ProviderKind::Local),
            ProviderDescriptor {
                name: "local".to_string(),
                kind: ProviderKind::Local,
                available: false,
                cost_per_request: 0.0,
                latency_estimate_ms: 0.0,
            }
        );
    }
}
