//! Response generator
//!
//! Renders the intent template, then layers in upsell and negotiation text
//! and fits the result into the configured length. The conversation context
//! is read only; attempts made are returned for the session owner to record.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sari_sari_config::ResponseConfig;
use sari_sari_core::{
    BusinessContext, ConversationContext, Intent, NegotiationAttempt, UpsellAttempt,
};

use super::negotiation::{Negotiation, NegotiationPolicy};
use super::personality::Personality;
use super::templates;
use super::truncation::truncate_response;
use super::upsell::UpsellPolicy;

/// Final reply plus the attempts it made
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReply {
    pub text: String,
    pub upsell: Option<UpsellAttempt>,
    pub negotiation: Option<NegotiationAttempt>,
}

pub struct ResponseGenerator {
    personality: Personality,
    upsell: UpsellPolicy,
    negotiation: NegotiationPolicy,
    max_length: usize,
}

impl ResponseGenerator {
    pub fn new(config: &ResponseConfig) -> Self {
        Self {
            personality: Personality::new(&config.personality),
            upsell: UpsellPolicy::from_config(config),
            negotiation: NegotiationPolicy::from_config(config),
            max_length: config.max_response_length,
        }
    }

    pub fn personality(&self) -> &Personality {
        &self.personality
    }

    pub fn generate(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        context: &ConversationContext,
        now: DateTime<Utc>,
    ) -> GeneratedReply {
        let mut text = templates::render(intent, business, context, &self.personality);

        let mut negotiation_attempt = None;
        if let Some(negotiation) = self.negotiation.negotiate(intent, business, context, now) {
            push_sentence(&mut text, negotiation.text());
            if let Negotiation::Offer { attempt, .. } = negotiation {
                negotiation_attempt = Some(attempt);
            }
        }

        // Upsell goes last so truncation drops it first
        let upsell = self.upsell.suggest(intent, business, context, now);
        if let Some(upsell) = &upsell {
            push_sentence(&mut text, &upsell.text);
        }

        let truncated = truncate_response(&text, self.max_length);
        // An upsell that did not survive truncation was never shown
        let upsell = upsell
            .filter(|u| truncated.contains(u.text.as_str()))
            .map(|u| u.attempt);

        GeneratedReply {
            text: truncated,
            upsell,
            negotiation: negotiation_attempt,
        }
    }
}

fn push_sentence(text: &mut String, sentence: &str) {
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(sentence);
}
