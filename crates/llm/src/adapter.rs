//! Provider capability interface
//!
//! `NlpProvider` is what the router dispatches to. The cloud and local
//! adapters share the same request shape, so the prompt/parse steps live
//! here as helpers over any `LlmBackend`.

use async_trait::async_trait;

use sari_sari_core::{
    BusinessContext, ConversationContext, Degradation, EntityExtraction, GeneratedResponse,
    Intent, IntentClassification, IntentKind, Outcome, ProviderKind,
};

use crate::backend::{FinishReason, GenerationResult, LlmBackend};
use crate::parse::{parse_entities, parse_intent};
use crate::prompt::{entity_messages, intent_messages, response_messages};
use crate::LlmError;

/// Confidence assigned when an intent reply cannot be parsed
pub const MALFORMED_INTENT_CONFIDENCE: f32 = 0.3;

/// An inference provider the router can dispatch to
#[async_trait]
pub trait NlpProvider: Send + Sync {
    /// Name used as the metrics usage key
    fn name(&self) -> &str;

    fn kind(&self) -> ProviderKind;

    /// Classify a customer message
    async fn classify_intent(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Result<Outcome<IntentClassification>, LlmError>;

    /// Extract shopping entities from a customer message
    async fn extract_entities(&self, message: &str) -> Result<Outcome<EntityExtraction>, LlmError>;

    /// Generate a customer-facing reply
    async fn generate_response(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        original_message: Option<&str>,
    ) -> Result<Outcome<GeneratedResponse>, LlmError>;

    /// Probe reachability. Never fails.
    async fn test_connection(&self) -> bool;

    /// Estimated cost of one request (USD)
    fn estimated_cost_per_request(&self) -> f64;

    /// Estimated latency of one request (ms)
    fn estimated_latency_ms(&self) -> f64;
}

/// A reply that arrived but whose envelope could not be decoded is treated
/// like unparseable JSON; everything else is a transport failure.
fn malformed_detail(err: &LlmError) -> Option<String> {
    match err {
        LlmError::InvalidResponse(detail) => Some(detail.clone()),
        _ => None,
    }
}

/// One backend round trip, logged with its token count
async fn generate(
    backend: &dyn LlmBackend,
    provider: &str,
    operation: &'static str,
    messages: &[crate::prompt::Message],
) -> Result<GenerationResult, LlmError> {
    let reply = backend.generate(messages).await?;
    tracing::debug!(
        provider,
        operation,
        tokens = reply.tokens,
        total_time_ms = reply.total_time_ms,
        "Backend reply"
    );
    match reply.finish_reason {
        FinishReason::Stop => {}
        FinishReason::Length => {
            tracing::warn!(provider, operation, tokens = reply.tokens, "Reply hit the token limit")
        }
        FinishReason::Error => {
            tracing::warn!(provider, operation, "Backend reply has no stop reason")
        }
    }
    Ok(reply)
}

/// Drop a trailing partial sentence from a reply cut at the token limit
fn complete_sentences(text: &str) -> &str {
    match text.rfind(['.', '!', '?']) {
        Some(end) if end > 0 => &text[..=end],
        _ => text,
    }
}

pub(crate) async fn classify_with(
    backend: &dyn LlmBackend,
    provider: &str,
    message: &str,
    context: &ConversationContext,
) -> Result<Outcome<IntentClassification>, LlmError> {
    let malformed = |detail: String| {
        tracing::warn!(provider, detail = %detail, "Malformed intent reply");
        Outcome::Degraded(
            IntentClassification::new(IntentKind::Unknown, MALFORMED_INTENT_CONFIDENCE, None),
            Degradation::MalformedResponse { detail },
        )
    };

    let messages = intent_messages(message, context);
    let reply = match generate(backend, provider, "classify_intent", &messages).await {
        Ok(reply) => reply,
        Err(e) => return malformed_detail(&e).map(malformed).ok_or(e),
    };

    Ok(match parse_intent(&reply.text) {
        Ok(classification) => {
            tracing::debug!(
                provider,
                intent = %classification.intent,
                confidence = classification.confidence,
                "Classified intent"
            );
            Outcome::Ok(classification)
        }
        Err(detail) => malformed(detail),
    })
}

pub(crate) async fn extract_with(
    backend: &dyn LlmBackend,
    provider: &str,
    message: &str,
) -> Result<Outcome<EntityExtraction>, LlmError> {
    let malformed = |detail: String| {
        tracing::warn!(provider, detail = %detail, "Malformed entity reply");
        Outcome::Degraded(EntityExtraction::empty(), Degradation::MalformedResponse { detail })
    };

    let messages = entity_messages(message);
    let reply = match generate(backend, provider, "extract_entities", &messages).await {
        Ok(reply) => reply,
        Err(e) => return malformed_detail(&e).map(malformed).ok_or(e),
    };

    Ok(match parse_entities(&reply.text) {
        Ok(extraction) => Outcome::Ok(extraction),
        Err(detail) => malformed(detail),
    })
}

pub(crate) async fn respond_with(
    backend: &dyn LlmBackend,
    provider: &str,
    intent: &Intent,
    business: &BusinessContext,
    original_message: Option<&str>,
) -> Result<Outcome<GeneratedResponse>, LlmError> {
    let messages = response_messages(intent, business, original_message);
    let reply = generate(backend, provider, "generate_response", &messages).await?;
    let text = reply.text.trim();
    let text = match reply.finish_reason {
        FinishReason::Length => complete_sentences(text),
        _ => text,
    };
    Ok(Outcome::Ok(GeneratedResponse::new(text)))
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedBackend;
    use super::*;
    use sari_sari_core::EntityType;

    #[tokio::test]
    async fn test_classify_parses_reply() {
        let backend = ScriptedBackend::new(vec![Ok(
            r#"{"intent": "add_to_cart", "confidence": 0.92, "reasoning": "wants two"}"#.into(),
        )]);
        let ctx = ConversationContext::new("s1");
        let outcome = classify_with(&backend, "cloud", "dalawang bigas po", &ctx)
            .await
            .unwrap();
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.value().intent, IntentKind::AddToCart);
    }

    #[tokio::test]
    async fn test_classify_malformed_is_degraded() {
        let backend = ScriptedBackend::new(vec![Ok("I'm not sure, maybe a greeting?".into())]);
        let ctx = ConversationContext::new("s1");
        let outcome = classify_with(&backend, "cloud", "hi", &ctx).await.unwrap();
        assert!(matches!(
            outcome.degradation(),
            Some(Degradation::MalformedResponse { .. })
        ));
        assert_eq!(outcome.value().intent, IntentKind::Unknown);
        assert_eq!(outcome.value().confidence, MALFORMED_INTENT_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_undecodable_envelope_is_degraded() {
        let backend =
            ScriptedBackend::new(vec![Err(LlmError::InvalidResponse("missing field".into()))]);
        let outcome = extract_with(&backend, "local", "rice").await.unwrap();
        assert!(outcome.is_degraded());
        assert!(outcome.value().entities.is_empty());
        assert_eq!(outcome.value().confidence, 0.0);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let backend = ScriptedBackend::new(vec![Err(LlmError::Timeout)]);
        let ctx = ConversationContext::new("s1");
        let err = classify_with(&backend, "cloud", "hi", &ctx).await.unwrap_err();
        assert_eq!(err, LlmError::Timeout);
    }

    #[tokio::test]
    async fn test_extract_entities() {
        let backend = ScriptedBackend::new(vec![Ok(
            r#"{"entities": [{"type": "product_name", "value": "sardines", "confidence": 0.9}], "confidence": 0.9}"#
                .into(),
        )]);
        let outcome = extract_with(&backend, "local", "sardinas").await.unwrap();
        let extraction = outcome.into_value();
        assert_eq!(extraction.entities.len(), 1);
        assert_eq!(extraction.entities[0].entity_type, EntityType::ProductName);
    }

    #[tokio::test]
    async fn test_empty_response_text_is_ok() {
        let backend = ScriptedBackend::new(vec![Ok("   ".into())]);
        let intent = Intent::new(IntentKind::Greeting, 0.9);
        let outcome = respond_with(&backend, "cloud", &intent, &BusinessContext::default(), None)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Ok(GeneratedResponse::new("")));
    }

    #[tokio::test]
    async fn test_reply_cut_at_token_limit_keeps_whole_sentences() {
        let intent = Intent::new(IntentKind::PriceInquiry, 0.9);
        let backend = ScriptedBackend::new(vec![
            Ok("Ang bigas po ay ₱55.00 per kilo. Meron din po kaming promo sa".into()),
            Ok("Sige po salamat".into()),
        ])
        .truncated();

        let outcome = respond_with(&backend, "local", &intent, &BusinessContext::default(), None)
            .await
            .unwrap();
        assert_eq!(outcome.value().text, "Ang bigas po ay ₱55.00 per kilo.");

        // Nothing to cut back to
        let outcome = respond_with(&backend, "local", &intent, &BusinessContext::default(), None)
            .await
            .unwrap();
        assert_eq!(outcome.value().text, "Sige po salamat");
    }

    #[tokio::test]
    async fn test_complete_reply_is_not_trimmed() {
        let backend = ScriptedBackend::new(vec![Ok("Meron po. Ilan po?".into())]);
        let intent = Intent::new(IntentKind::ProductInquiry, 0.9);
        let outcome = respond_with(&backend, "cloud", &intent, &BusinessContext::default(), None)
            .await
            .unwrap();
        assert_eq!(outcome.value().text, "Meron po. Ilan po?");
    }
}
