//! NLP service
//!
//! Orchestrates sanitation, routed classification and extraction, negation
//! extraction and product-description search. Invalid input degrades every
//! routed operation to an empty result; only product-description search
//! reports it as an error.

use std::sync::Arc;

use sari_sari_core::{
    BusinessContext, ConversationContext, Degradation, EntityExtraction, GeneratedResponse, Intent,
    IntentClassification, IntentKind, NlpMetrics, Outcome,
};
use sari_sari_text_processing::{
    extract_negations, sanitize, Negation, SanitizeLimits, TextProcessingError,
};

use crate::router::{AiRouter, Routed, NO_PROVIDER};
use crate::search::{ProductDescription, ProductSearch, SearchError};
use crate::NlpError;

/// Merged classification and extraction of one message
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NlpAnalysis {
    pub intent: Routed<Intent>,
    pub negations: Vec<Negation>,
}

pub struct NlpService {
    router: Arc<AiRouter>,
    search: Option<Arc<dyn ProductSearch>>,
    limits: SanitizeLimits,
}

fn invalid<T>(value: T, err: &TextProcessingError) -> Routed<T> {
    Routed {
        outcome: Outcome::Degraded(
            value,
            Degradation::InvalidInput {
                detail: err.to_string(),
            },
        ),
        provider: NO_PROVIDER.to_string(),
        latency_ms: 0,
    }
}

impl NlpService {
    pub fn new(router: Arc<AiRouter>, limits: SanitizeLimits) -> Self {
        Self {
            router,
            search: None,
            limits,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn ProductSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn router(&self) -> &Arc<AiRouter> {
        &self.router
    }

    fn sanitize(&self, message: &str) -> Result<String, TextProcessingError> {
        sanitize(message, &self.limits).map_err(|e| {
            tracing::debug!(error = %e, "Rejected customer message");
            e
        })
    }

    /// Classify, extract entities and find negations in one pass
    pub async fn analyze(&self, message: &str, context: &ConversationContext) -> NlpAnalysis {
        let clean = match self.sanitize(message) {
            Ok(clean) => clean,
            Err(e) => {
                return NlpAnalysis {
                    intent: invalid(Intent::unknown(0.0), &e),
                    negations: Vec::new(),
                }
            }
        };

        let (classification, extraction) = futures::join!(
            self.router.classify_intent(&clean, context),
            self.router.extract_entities(&clean),
        );

        // Negations never depend on provider health
        let negations = extract_negations(&clean);

        let latency_ms = classification.latency_ms.max(extraction.latency_ms);
        let provider = classification.provider;
        let (classified, intent_reason) = classification.outcome.into_parts();
        let (extracted, entity_reason) = extraction.outcome.into_parts();

        let intent = Intent::new(classified.intent, classified.confidence)
            .with_entities(extracted.entities);
        let outcome = match intent_reason.or(entity_reason) {
            Some(reason) => Outcome::Degraded(intent, reason),
            None => Outcome::Ok(intent),
        };

        NlpAnalysis {
            intent: Routed {
                outcome,
                provider,
                latency_ms,
            },
            negations,
        }
    }

    pub async fn classify_intent(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Routed<IntentClassification> {
        match self.sanitize(message) {
            Ok(clean) => self.router.classify_intent(&clean, context).await,
            Err(e) => invalid(IntentClassification::new(IntentKind::Unknown, 0.0, None), &e),
        }
    }

    pub async fn extract_entities(&self, message: &str) -> Routed<EntityExtraction> {
        match self.sanitize(message) {
            Ok(clean) => self.router.extract_entities(&clean).await,
            Err(e) => invalid(EntityExtraction::empty(), &e),
        }
    }

    /// An invalid original message is dropped from the prompt, not rejected
    pub async fn generate_response(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        original_message: Option<&str>,
    ) -> Routed<GeneratedResponse> {
        let original = original_message.and_then(|m| self.sanitize(m).ok());
        self.router
            .generate_response(intent, business, original.as_deref())
            .await
    }

    /// Negated terms in the message; empty on invalid input
    pub fn extract_negations(&self, message: &str) -> Vec<Negation> {
        self.sanitize(message)
            .map(|clean| extract_negations(&clean))
            .unwrap_or_default()
    }

    /// Resolve a free-text product description. Every failure is returned.
    pub async fn extract_product_description(
        &self,
        message: &str,
    ) -> Result<ProductDescription, NlpError> {
        let clean = self.sanitize(message)?;
        let search = self
            .search
            .as_ref()
            .ok_or(NlpError::Search(SearchError::NotConfigured))?;
        search.search(&clean).await.map_err(|e| {
            tracing::warn!(error = %e, "Product description search failed");
            NlpError::Search(e)
        })
    }

    pub fn metrics(&self) -> NlpMetrics {
        self.router.metrics()
    }

    pub fn reset_metrics(&self) {
        self.router.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::testing::{router_with, MockProvider};
    use crate::search::ProductMatch;
    use async_trait::async_trait;
    use sari_sari_config::{PreferredProvider, RouterConfig};
    use sari_sari_core::{EntityType, ProviderKind};
    use sari_sari_text_processing::NegationType;

    struct StaticSearch(Result<ProductDescription, SearchError>);

    #[async_trait]
    impl ProductSearch for StaticSearch {
        async fn search(&self, _query: &str) -> Result<ProductDescription, SearchError> {
            self.0.clone()
        }
    }

    async fn service(providers: Vec<Arc<MockProvider>>) -> NlpService {
        let config = RouterConfig {
            preferred_provider: PreferredProvider::Cloud,
            ..Default::default()
        };
        let (router, _) = router_with(config, providers).await;
        NlpService::new(Arc::new(router), SanitizeLimits::default())
    }

    #[tokio::test]
    async fn test_analyze_merges_intent_and_entities() {
        let svc = service(vec![Arc::new(MockProvider::new(ProviderKind::Cloud))]).await;
        let ctx = ConversationContext::new("s1");

        let analysis = svc.analyze("  may   kape ba kayo? no sugar  ", &ctx).await;
        assert!(!analysis.intent.is_degraded());
        let intent = analysis.intent.value();
        assert_eq!(intent.name, IntentKind::ProductInquiry);
        assert_eq!(intent.first_value(EntityType::ProductName), Some("coffee"));
        assert_eq!(analysis.negations.len(), 1);
        assert_eq!(analysis.negations[0].negated_term, "sugar");
        assert_eq!(svc.metrics().total_requests, 2);
    }

    #[tokio::test]
    async fn test_analyze_average_latency_covers_both_calls() {
        let cloud = MockProvider::new(ProviderKind::Cloud)
            .with_delay(std::time::Duration::from_millis(100));
        let svc = service(vec![Arc::new(cloud)]).await;

        let analysis = svc.analyze("hello", &ConversationContext::new("s1")).await;
        assert!(analysis.intent.latency_ms >= 100);

        let metrics = svc.metrics();
        assert_eq!(metrics.total_requests, 2);
        assert!(
            metrics.average_latency_ms >= 100.0,
            "average {} below per-call latency",
            metrics.average_latency_ms
        );
    }

    #[tokio::test]
    async fn test_invalid_input_degrades() {
        let svc = service(vec![Arc::new(MockProvider::new(ProviderKind::Cloud))]).await;
        let ctx = ConversationContext::new("s1");

        let analysis = svc.analyze("   ", &ctx).await;
        assert!(matches!(
            analysis.intent.outcome.degradation(),
            Some(Degradation::InvalidInput { .. })
        ));
        assert_eq!(analysis.intent.value().name, IntentKind::Unknown);
        assert_eq!(analysis.intent.value().confidence, 0.0);
        assert!(analysis.intent.value().entities.is_empty());

        let entities = svc.extract_entities("").await;
        assert!(entities.is_degraded());
        assert!(entities.value().entities.is_empty());

        let intent = svc.classify_intent("\n\t", &ctx).await;
        assert_eq!(intent.value().intent, IntentKind::Unknown);

        assert!(svc.extract_negations("").is_empty());
        assert_eq!(svc.metrics().total_requests, 0);
    }

    #[tokio::test]
    async fn test_negations_without_any_provider() {
        let svc = service(vec![
            Arc::new(MockProvider::new(ProviderKind::Cloud).unavailable()),
            Arc::new(MockProvider::new(ProviderKind::Local).unavailable()),
        ])
        .await;

        let first = svc.extract_negations("I don't like spicy food");
        let second = svc.extract_negations("I don't like spicy food");
        assert_eq!(first, second);
        assert_eq!(first[0].negated_term, "spicy");
        assert_eq!(first[0].negation_type, NegationType::Characteristic);

        let ctx = ConversationContext::new("s1");
        let analysis = svc.analyze("no spicy", &ctx).await;
        assert!(analysis.intent.is_degraded());
        assert_eq!(analysis.negations.len(), 1);
        assert_eq!(analysis.negations[0].negation_type, NegationType::Ingredient);
    }

    #[tokio::test]
    async fn test_product_description_errors_propagate() {
        let ctx_svc = service(vec![Arc::new(MockProvider::new(ProviderKind::Cloud))]).await;
        assert!(matches!(
            ctx_svc.extract_product_description("sardinas").await,
            Err(NlpError::Search(SearchError::NotConfigured))
        ));

        for error in [
            SearchError::Auth(401),
            SearchError::NotFound,
            SearchError::Server {
                status: 503,
                message: "down".to_string(),
            },
            SearchError::NoResults,
        ] {
            let svc = service(vec![Arc::new(MockProvider::new(ProviderKind::Cloud))])
                .await
                .with_search(Arc::new(StaticSearch(Err(error.clone()))));
            assert_eq!(
                svc.extract_product_description("maanghang na sardinas").await,
                Err(NlpError::Search(error))
            );
        }
    }

    #[tokio::test]
    async fn test_product_description_rejects_empty_input() {
        let found = ProductDescription {
            query: "x".to_string(),
            matches: vec![ProductMatch {
                product_id: "sardines-spicy".to_string(),
                name: "Spicy Sardines".to_string(),
                score: 0.91,
                description: None,
            }],
        };
        let svc = service(vec![Arc::new(MockProvider::new(ProviderKind::Cloud))])
            .await
            .with_search(Arc::new(StaticSearch(Ok(found.clone()))));

        assert!(matches!(
            svc.extract_product_description("   ").await,
            Err(NlpError::Validation(TextProcessingError::Empty))
        ));
        assert_eq!(svc.extract_product_description("spicy sardines").await, Ok(found));
    }
}
