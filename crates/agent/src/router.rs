//! AI provider router
//!
//! Chooses between the cloud and local adapters from a static preference
//! list with cost/latency gating, dispatches one call, and falls back to the
//! keyword classifier when the chosen provider fails in transit.
//!
//! Availability is probed when the router is built and again only on an
//! explicit `refresh_availability()`. Nothing re-checks health per call.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use sari_sari_config::{PreferredProvider, RouterConfig};
use sari_sari_core::{
    BusinessContext, ConversationContext, Degradation, EntityExtraction, GeneratedResponse, Intent,
    IntentClassification, IntentKind, MetricsRecorder, NlpMetrics, Outcome, ProviderDescriptor,
    ProviderKind,
};
use sari_sari_llm::{LlmError, NlpProvider, ProviderFactory};
use sari_sari_text_processing::{SimpleClassifier, SIMPLE_TEMPLATE_PROVIDER};

/// Usage key reported when no provider could be selected
pub const NO_PROVIDER: &str = "none";

/// Confidence of the intent returned when selection fails
pub const SELECTION_FAILURE_CONFIDENCE: f32 = 0.1;

const SELECTION_FAILURE_REPLY: &str =
    "Pasensya na po, I can't answer right now. Please try again in a moment.";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterError {
    #[error("No provider available")]
    NoProviderAvailable,

    #[error("No provider meets the configured cost/latency thresholds")]
    NoProviderMeetsThresholds,
}

impl From<RouterError> for Degradation {
    fn from(err: RouterError) -> Self {
        match err {
            RouterError::NoProviderAvailable => Degradation::NoProviderAvailable,
            RouterError::NoProviderMeetsThresholds => Degradation::NoProviderMeetsThresholds,
        }
    }
}

/// Result of provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub kind: ProviderKind,
    /// The policy named a specific provider and another one was chosen
    pub fell_back: bool,
}

fn within_thresholds(policy: &RouterConfig, provider: &ProviderDescriptor) -> bool {
    policy
        .cost_threshold
        .map_or(true, |max| provider.cost_per_request <= max)
        && policy
            .latency_threshold
            .map_or(true, |max| provider.latency_estimate_ms <= max)
}

/// Pick a provider from an availability snapshot. No I/O.
pub fn select_provider(
    policy: &RouterConfig,
    providers: &[ProviderDescriptor],
) -> Result<Selection, RouterError> {
    let available: Vec<&ProviderDescriptor> = providers.iter().filter(|p| p.available).collect();
    let has = |kind: ProviderKind| available.iter().any(|p| p.kind == kind);

    match available.as_slice() {
        [] => return Err(RouterError::NoProviderAvailable),
        [only] => {
            return Ok(Selection {
                kind: only.kind,
                fell_back: policy
                    .preferred_provider
                    .kind()
                    .is_some_and(|preferred| preferred != only.kind),
            });
        }
        _ => {}
    }

    match policy.preferred_provider {
        PreferredProvider::Cloud | PreferredProvider::Local => {
            let preferred = policy
                .preferred_provider
                .kind()
                .unwrap_or(ProviderKind::Local);
            if has(preferred) {
                return Ok(Selection { kind: preferred, fell_back: false });
            }
            let fallback = policy
                .fallback_provider
                .filter(|kind| has(*kind))
                .or_else(|| available.first().map(|p| p.kind))
                .ok_or(RouterError::NoProviderAvailable)?;
            Ok(Selection { kind: fallback, fell_back: true })
        }
        PreferredProvider::Auto => {
            if has(ProviderKind::Local) {
                return Ok(Selection { kind: ProviderKind::Local, fell_back: false });
            }
            available
                .iter()
                .find(|p| p.kind == ProviderKind::Cloud && within_thresholds(policy, p))
                .map(|p| Selection { kind: p.kind, fell_back: false })
                .ok_or(RouterError::NoProviderMeetsThresholds)
        }
    }
}

/// A routed result with the provider that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routed<T> {
    pub outcome: Outcome<T>,
    /// Usage key: provider name, `simple_template` or `none`
    pub provider: String,
    pub latency_ms: u64,
}

impl<T> Routed<T> {
    pub fn is_degraded(&self) -> bool {
        self.outcome.is_degraded()
    }

    pub fn value(&self) -> &T {
        self.outcome.value()
    }

    pub fn into_value(self) -> T {
        self.outcome.into_value()
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Routed<U> {
        Routed {
            outcome: self.outcome.map(f),
            provider: self.provider,
            latency_ms: self.latency_ms,
        }
    }
}

struct Registration {
    descriptor: ProviderDescriptor,
    /// `None` when the adapter could not be constructed
    provider: Option<Arc<dyn NlpProvider>>,
}

/// AI router
pub struct AiRouter {
    config: RouterConfig,
    registry: RwLock<BTreeMap<ProviderKind, Registration>>,
    metrics: Arc<MetricsRecorder>,
    fallback: SimpleClassifier,
}

async fn probe(provider: &Arc<dyn NlpProvider>) -> ProviderDescriptor {
    let available = provider.test_connection().await;
    ProviderDescriptor {
        name: provider.name().to_string(),
        kind: provider.kind(),
        available,
        cost_per_request: provider.estimated_cost_per_request(),
        latency_estimate_ms: provider.estimated_latency_ms(),
    }
}

impl AiRouter {
    /// Build every configured adapter and probe it. Never fails: a provider
    /// that cannot be constructed is registered as unavailable.
    pub async fn from_config(config: RouterConfig, metrics: Arc<MetricsRecorder>) -> Self {
        let mut providers = Vec::new();
        let mut broken = Vec::new();
        for (kind, built) in ProviderFactory::from_router_config(&config) {
            match built {
                Ok(provider) => providers.push(provider),
                Err(e) => {
                    tracing::warn!(provider = %kind, error = %e, "Provider could not be constructed");
                    broken.push(kind);
                }
            }
        }

        let router = Self::with_providers(config, providers, metrics).await;
        {
            let mut registry = router.registry.write();
            for kind in broken {
                registry.entry(kind).or_insert_with(|| Registration {
                    descriptor: ProviderDescriptor::unavailable(kind.as_str(), kind),
                    provider: None,
                });
            }
        }
        router
    }

    /// Register the given adapters and probe them concurrently
    pub async fn with_providers(
        config: RouterConfig,
        providers: Vec<Arc<dyn NlpProvider>>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        let descriptors = futures::future::join_all(providers.iter().map(probe)).await;

        let mut registry = BTreeMap::new();
        for (provider, descriptor) in providers.into_iter().zip(descriptors) {
            tracing::info!(
                provider = %descriptor.name,
                kind = %descriptor.kind,
                available = descriptor.available,
                "Registered provider"
            );
            registry.insert(
                descriptor.kind,
                Registration {
                    descriptor,
                    provider: Some(provider),
                },
            );
        }

        Self {
            config,
            registry: RwLock::new(registry),
            metrics,
            fallback: SimpleClassifier::new(),
        }
    }

    /// Re-probe every constructed adapter
    pub async fn refresh_availability(&self) {
        let providers: Vec<Arc<dyn NlpProvider>> = self
            .registry
            .read()
            .values()
            .filter_map(|r| r.provider.clone())
            .collect();

        let descriptors = futures::future::join_all(providers.iter().map(probe)).await;

        let mut registry = self.registry.write();
        for descriptor in descriptors {
            if let Some(registration) = registry.get_mut(&descriptor.kind) {
                if registration.descriptor.available != descriptor.available {
                    tracing::info!(
                        provider = %descriptor.name,
                        available = descriptor.available,
                        "Provider availability changed"
                    );
                }
                registration.descriptor = descriptor;
            }
        }
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.registry
            .read()
            .values()
            .map(|r| r.descriptor.clone())
            .collect()
    }

    /// Provider the next call would use. Read-only and silent, so health
    /// checks can poll it.
    pub fn select_provider(&self) -> Result<ProviderDescriptor, RouterError> {
        let snapshot = self.descriptors();
        let selection = select_provider(&self.config, &snapshot)?;
        snapshot
            .into_iter()
            .find(|d| d.kind == selection.kind)
            .ok_or(RouterError::NoProviderAvailable)
    }

    fn select(&self) -> Result<(ProviderDescriptor, Arc<dyn NlpProvider>), RouterError> {
        let registry = self.registry.read();
        let snapshot: Vec<ProviderDescriptor> =
            registry.values().map(|r| r.descriptor.clone()).collect();

        let selection = select_provider(&self.config, &snapshot)?;
        if selection.fell_back {
            tracing::warn!(
                preferred = ?self.config.preferred_provider,
                selected = %selection.kind,
                "Preferred provider unavailable, falling back"
            );
        }

        registry
            .get(&selection.kind)
            .and_then(|r| r.provider.clone().map(|p| (r.descriptor.clone(), p)))
            .ok_or(RouterError::NoProviderAvailable)
    }

    /// Per-call protocol shared by every routed operation
    async fn route<T, Call, Fut, Fallback>(
        &self,
        operation: &'static str,
        sentinel: T,
        call: Call,
        fallback: Fallback,
    ) -> Routed<T>
    where
        Call: FnOnce(Arc<dyn NlpProvider>) -> Fut,
        Fut: Future<Output = Result<Outcome<T>, LlmError>>,
        Fallback: FnOnce() -> T,
    {
        self.metrics.record_request();

        let (descriptor, provider) = match self.select() {
            Ok(selected) => selected,
            Err(e) => {
                tracing::warn!(operation, error = %e, "Provider selection failed");
                self.metrics.record_failure();
                return Routed {
                    outcome: Outcome::Degraded(sentinel, e.into()),
                    provider: NO_PROVIDER.to_string(),
                    latency_ms: 0,
                };
            }
        };

        let start = Instant::now();
        let (outcome, key, cost) = match call(provider).await {
            Ok(outcome) => (outcome, descriptor.name.clone(), descriptor.cost_per_request),
            Err(e) => {
                tracing::warn!(
                    operation,
                    provider = %descriptor.name,
                    error = %e,
                    "Provider call failed, using simple classifier"
                );
                let degradation = Degradation::ProviderFailed {
                    provider: descriptor.name.clone(),
                    error: e.to_string(),
                };
                (
                    Outcome::Degraded(fallback(), degradation),
                    SIMPLE_TEMPLATE_PROVIDER.to_string(),
                    0.0,
                )
            }
        };
        let latency = start.elapsed();

        self.metrics
            .record_usage(&key, latency.as_secs_f64() * 1000.0, cost);
        // Fallback results count as successes too; provider_usage tells them apart
        self.metrics.record_success();

        Routed {
            outcome,
            provider: key,
            latency_ms: latency.as_millis() as u64,
        }
    }

    pub async fn classify_intent(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Routed<IntentClassification> {
        self.route(
            "classify_intent",
            IntentClassification::new(IntentKind::Unknown, SELECTION_FAILURE_CONFIDENCE, None),
            |provider| async move { provider.classify_intent(message, context).await },
            || self.fallback.classify_intent(message),
        )
        .await
    }

    pub async fn extract_entities(&self, message: &str) -> Routed<EntityExtraction> {
        self.route(
            "extract_entities",
            EntityExtraction::empty(),
            |provider| async move { provider.extract_entities(message).await },
            || self.fallback.extract_entities(message),
        )
        .await
    }

    pub async fn generate_response(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        original_message: Option<&str>,
    ) -> Routed<GeneratedResponse> {
        self.route(
            "generate_response",
            GeneratedResponse::new(SELECTION_FAILURE_REPLY),
            |provider| async move {
                provider
                    .generate_response(intent, business, original_message)
                    .await
            },
            || self.fallback.generate_response(intent, business),
        )
        .await
    }

    pub fn metrics(&self) -> NlpMetrics {
        self.metrics.snapshot()
    }

    pub fn reset_metrics(&self) {
        self.metrics.reset();
    }

    /// Shared recorder handed in at construction
    pub fn recorder(&self) -> &Arc<MetricsRecorder> {
        &self.metrics
    }
}
