//! End-to-end routing tests: adapters over scripted backends, the router,
//! the NLP service and the response generator together.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use sari_sari_agent::{AiRouter, NlpService, ResponseGenerator, NO_PROVIDER};
use sari_sari_config::{PreferredProvider, ResponseConfig, RouterConfig};
use sari_sari_core::{
    BusinessContext, ConversationContext, Degradation, EntityType, IntentKind, MetricsRecorder,
    Product, ProviderKind,
};
use sari_sari_llm::{
    CloudProvider, FinishReason, GenerationResult, LlmBackend, LlmError, LocalProvider, Message,
    NlpProvider,
};
use sari_sari_text_processing::{
    NegationType, SanitizeLimits, SimpleClassifier, SIMPLE_TEMPLATE_PROVIDER,
};

/// Answers each prompt family with a canned reply
struct StoreBackend {
    intent_reply: String,
    available: AtomicBool,
    fail: bool,
    calls: AtomicUsize,
}

impl StoreBackend {
    fn new(intent_reply: &str) -> Self {
        Self {
            intent_reply: intent_reply.to_string(),
            available: AtomicBool::new(true),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn down() -> Self {
        let backend = Self::new("");
        backend.available.store(false, Ordering::SeqCst);
        backend
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }
}

#[async_trait]
impl LlmBackend for StoreBackend {
    async fn generate(&self, messages: &[Message]) -> Result<GenerationResult, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(LlmError::Timeout);
        }
        let system = &messages[0].content;
        let text = if system.starts_with("You classify") {
            self.intent_reply.clone()
        } else if system.starts_with("You extract") {
            r#"{"entities": [{"type": "quantity", "value": "2", "confidence": 0.9},
                {"type": "product_name", "value": "rice", "confidence": 0.9}], "confidence": 0.9}"#
                .to_string()
        } else {
            "Sige po, dalawang kilo ng bigas.".to_string()
        };
        Ok(GenerationResult {
            text,
            tokens: 12,
            total_time_ms: 5,
            finish_reason: FinishReason::Stop,
        })
    }

    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn model_name(&self) -> &str {
        "store-test"
    }
}

const ADD_TO_CART: &str = r#"{"intent": "add_to_cart", "confidence": 0.93, "reasoning": "order"}"#;

fn business() -> BusinessContext {
    BusinessContext {
        store_name: "Tindahan ni Aling Nena".to_string(),
        inventory: vec![
            Product {
                id: "rice".to_string(),
                name: "Rice".to_string(),
                category: "grains".to_string(),
                price: 55.0,
                unit: "kg".to_string(),
                stock: 20,
                descriptors: Vec::new(),
                min_price: Some(50.0),
            },
            Product {
                id: "eggs".to_string(),
                name: "Eggs".to_string(),
                category: "fresh".to_string(),
                price: 9.0,
                unit: "piece".to_string(),
                stock: 60,
                descriptors: Vec::new(),
                min_price: None,
            },
        ],
        promotions: Vec::new(),
        cart: Vec::new(),
    }
}

fn cloud(backend: StoreBackend) -> Arc<dyn NlpProvider> {
    Arc::new(CloudProvider::with_backend("cloud", Arc::new(backend), 0.0008, 600.0))
}

fn local(backend: StoreBackend) -> Arc<dyn NlpProvider> {
    Arc::new(LocalProvider::with_backend(
        "local",
        "http://localhost:11434",
        Arc::new(backend),
        400.0,
    ))
}

async fn service(
    preferred: PreferredProvider,
    providers: Vec<Arc<dyn NlpProvider>>,
) -> (NlpService, Arc<MetricsRecorder>) {
    let metrics = Arc::new(MetricsRecorder::new());
    let config = RouterConfig {
        preferred_provider: preferred,
        ..Default::default()
    };
    let router = AiRouter::with_providers(config, providers, metrics.clone()).await;
    (NlpService::new(Arc::new(router), SanitizeLimits::default()), metrics)
}

#[tokio::test]
async fn test_auto_routes_to_local_and_builds_reply() {
    let (svc, metrics) = service(
        PreferredProvider::Auto,
        vec![cloud(StoreBackend::new(ADD_TO_CART)), local(StoreBackend::new(ADD_TO_CART))],
    )
    .await;
    let mut ctx = ConversationContext::new("session-1");

    let analysis = svc.analyze("Pabili po ng 2 kilo ng bigas", &ctx).await;
    assert!(!analysis.intent.is_degraded());
    assert_eq!(analysis.intent.provider, "local");
    let intent = analysis.intent.value().clone();
    assert_eq!(intent.name, IntentKind::AddToCart);
    assert_eq!(intent.first_value(EntityType::Quantity), Some("2"));

    ctx.set_intent(intent.clone());
    let generator = ResponseGenerator::new(&ResponseConfig::default());
    let reply = generator.generate(&intent, &business(), &ctx, Utc::now());
    assert!(reply.text.starts_with("Sige po, 2 kg of Rice for ₱110.00."));
    assert_eq!(reply.upsell.map(|u| u.product_id).as_deref(), Some("eggs"));

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 2);
    assert_eq!(snapshot.successful_requests, 2);
    assert_eq!(snapshot.total_cost, 0.0);
    assert_eq!(snapshot.provider_usage.get("local"), Some(&2));
}

#[tokio::test]
async fn test_preferred_local_down_falls_back_to_cloud() {
    let (svc, metrics) = service(
        PreferredProvider::Local,
        vec![cloud(StoreBackend::new(ADD_TO_CART)), local(StoreBackend::down())],
    )
    .await;
    let selected = svc.router().select_provider().unwrap();
    assert_eq!(selected.kind, ProviderKind::Cloud);

    let ctx = ConversationContext::new("session-2");
    let routed = svc.classify_intent("dalawang kilo ng bigas", &ctx).await;
    assert_eq!(routed.provider, "cloud");
    assert!(!routed.is_degraded());
    assert!((metrics.snapshot().total_cost - 0.0008).abs() < 1e-12);
}

#[tokio::test]
async fn test_malformed_reply_is_soft_degradation() {
    let (svc, metrics) = service(
        PreferredProvider::Local,
        vec![local(StoreBackend::new("Sure! The customer wants rice."))],
    )
    .await;
    let ctx = ConversationContext::new("session-3");

    let routed = svc.classify_intent("bigas po", &ctx).await;
    assert_eq!(routed.provider, "local");
    assert!(matches!(
        routed.outcome.degradation(),
        Some(Degradation::MalformedResponse { .. })
    ));
    assert_eq!(routed.value().intent, IntentKind::Unknown);
    assert_eq!(routed.value().confidence, 0.3);
    assert_eq!(metrics.snapshot().successful_requests, 1);
}

#[tokio::test]
async fn test_transport_failure_uses_simple_classifier() {
    let (svc, metrics) = service(
        PreferredProvider::Cloud,
        vec![cloud(StoreBackend::failing())],
    )
    .await;
    let ctx = ConversationContext::new("session-4");

    for message in ["Hello there!", "How much is the sugar?", "add 3 pieces of soap"] {
        let routed = svc.classify_intent(message, &ctx).await;
        assert_eq!(routed.provider, SIMPLE_TEMPLATE_PROVIDER);
        assert_eq!(routed.value(), &SimpleClassifier::new().classify_intent(message));
        let confidence = routed.value().confidence;
        assert!((0.0..=1.0).contains(&confidence));
    }

    let greeting = svc.classify_intent("Hello there!", &ctx).await;
    assert_eq!(greeting.value().intent, IntentKind::Greeting);
    assert_eq!(greeting.value().confidence, 0.9);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.failed_requests, 0);
    assert_eq!(snapshot.successful_requests, 4);
    assert_eq!(snapshot.provider_usage.get(SIMPLE_TEMPLATE_PROVIDER), Some(&4));
}

#[tokio::test]
async fn test_no_provider_for_every_operation() {
    let (svc, metrics) = service(
        PreferredProvider::Auto,
        vec![cloud(StoreBackend::down()), local(StoreBackend::down())],
    )
    .await;
    let ctx = ConversationContext::new("session-5");

    let analysis = svc.analyze("no spicy", &ctx).await;
    assert_eq!(analysis.intent.provider, NO_PROVIDER);
    assert_eq!(
        analysis.intent.outcome.degradation(),
        Some(&Degradation::NoProviderAvailable)
    );
    assert!(analysis.intent.value().entities.is_empty());

    // Negations come through regardless
    assert_eq!(analysis.negations.len(), 1);
    assert_eq!(analysis.negations[0].negated_term, "spicy");
    assert_eq!(analysis.negations[0].negation_type, NegationType::Ingredient);
    assert_eq!(analysis.negations[0].confidence, 0.8);

    let reply = svc
        .generate_response(analysis.intent.value(), &business(), Some("no spicy"))
        .await;
    assert!(reply.is_degraded());

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.failed_requests, 3);
    assert_eq!(snapshot.successful_requests, 0);
}

#[tokio::test]
async fn test_refresh_availability_picks_up_recovery() {
    let backend = Arc::new(StoreBackend::down());
    let provider: Arc<dyn NlpProvider> = Arc::new(LocalProvider::with_backend(
        "local",
        "http://localhost:11434",
        backend.clone(),
        400.0,
    ));
    let router = AiRouter::with_providers(
        RouterConfig::default(),
        vec![provider],
        Arc::new(MetricsRecorder::new()),
    )
    .await;
    assert!(router.select_provider().is_err());

    backend.available.store(true, Ordering::SeqCst);
    // Not re-probed until asked
    assert!(router.select_provider().is_err());

    router.refresh_availability().await;
    assert_eq!(router.select_provider().map(|d| d.kind), Ok(ProviderKind::Local));
}
