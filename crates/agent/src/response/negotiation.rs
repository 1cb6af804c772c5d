//! Price negotiation
//!
//! Offers a fixed discount off list price, floored at the product's minimum
//! price, and caps offers per product within a rolling window.

use chrono::{DateTime, Duration, Utc};

use sari_sari_config::ResponseConfig;
use sari_sari_core::{BusinessContext, ConversationContext, Intent, IntentKind, NegotiationAttempt};

use super::templates::{anchor_product, peso};

/// Outcome of a haggling request
#[derive(Debug, Clone, PartialEq)]
pub enum Negotiation {
    /// Discounted offer to record against the product
    Offer { text: String, attempt: NegotiationAttempt },
    /// Cap reached or no room below list price
    Declined { text: String },
}

impl Negotiation {
    pub fn text(&self) -> &str {
        match self {
            Negotiation::Offer { text, .. } | Negotiation::Declined { text } => text,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NegotiationPolicy {
    enabled: bool,
    max_attempts: usize,
    window: Duration,
    max_discount_percent: f64,
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

impl NegotiationPolicy {
    pub fn from_config(config: &ResponseConfig) -> Self {
        Self {
            enabled: config.negotiation_enabled,
            max_attempts: config.negotiation_max_attempts,
            window: super::rolling_window(config.negotiation_window_secs),
            max_discount_percent: config.max_discount_percent,
        }
    }

    /// Discounted price, never below the product's floor
    pub fn offer_price(&self, price: f64, min_price: Option<f64>) -> f64 {
        let discounted = price * (1.0 - self.max_discount_percent / 100.0);
        round_cents(discounted.max(min_price.unwrap_or(0.0)))
    }

    /// Only `negotiation_start` with a known product gets a response
    pub fn negotiate(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        context: &ConversationContext,
        now: DateTime<Utc>,
    ) -> Option<Negotiation> {
        if !self.enabled || intent.name != IntentKind::NegotiationStart {
            return None;
        }
        let product = anchor_product(intent, business)?;

        if context.negotiations_within(&product.id, self.window, now) >= self.max_attempts {
            return Some(Negotiation::Declined {
                text: format!("That's already my best price for {}.", product.name),
            });
        }

        let offered = self.offer_price(product.price, product.min_price);
        if offered >= product.price {
            return Some(Negotiation::Declined {
                text: format!("{} is already at its lowest price.", product.name),
            });
        }

        tracing::debug!(product = %product.id, offered, "Negotiation offer");
        Some(Negotiation::Offer {
            text: format!(
                "For you, I can give {} at {} instead of {}.",
                product.name,
                peso(offered),
                peso(product.price)
            ),
            attempt: NegotiationAttempt {
                product_id: product.id.clone(),
                offered_price: offered,
                timestamp: now,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::fixtures::store;
    use sari_sari_core::{Entity, EntityType};

    fn haggle(name: &str) -> Intent {
        Intent::new(IntentKind::NegotiationStart, 0.8)
            .with_entities(vec![Entity::new(EntityType::ProductName, name, 0.9)])
    }

    fn policy() -> NegotiationPolicy {
        NegotiationPolicy::from_config(&ResponseConfig::default())
    }

    #[test]
    fn test_offer_respects_floor() {
        let policy = policy();
        assert_eq!(policy.offer_price(100.0, None), 90.0);
        assert_eq!(policy.offer_price(55.0, Some(52.0)), 52.0);
        assert_eq!(policy.offer_price(12.0, Some(12.0)), 12.0);
    }

    #[test]
    fn test_offer_for_negotiation_start() {
        let ctx = ConversationContext::new("s1");
        let result = policy().negotiate(&haggle("rice"), &store(), &ctx, Utc::now()).unwrap();
        match result {
            Negotiation::Offer { text, attempt } => {
                assert_eq!(attempt.product_id, "rice");
                assert_eq!(attempt.offered_price, 52.0);
                assert_eq!(text, "For you, I can give Rice at ₱52.00 instead of ₱55.00.");
            }
            other => panic!("expected offer, got {:?}", other),
        }
    }

    #[test]
    fn test_other_intents_ignored() {
        let ctx = ConversationContext::new("s1");
        let price = Intent::new(IntentKind::PriceInquiry, 0.9)
            .with_entities(vec![Entity::new(EntityType::ProductName, "rice", 0.9)]);
        assert!(policy().negotiate(&price, &store(), &ctx, Utc::now()).is_none());
    }

    #[test]
    fn test_attempt_cap_per_product() {
        let now = Utc::now();
        let mut ctx = ConversationContext::new("s1");
        for minutes_ago in [2, 8] {
            ctx.record_negotiation(NegotiationAttempt {
                product_id: "rice".to_string(),
                offered_price: 52.0,
                timestamp: now - Duration::minutes(minutes_ago),
            });
        }

        let rice = policy().negotiate(&haggle("rice"), &store(), &ctx, now).unwrap();
        assert!(matches!(rice, Negotiation::Declined { .. }));

        // Cap is per product
        let coffee = policy().negotiate(&haggle("coffee"), &store(), &ctx, now).unwrap();
        assert!(matches!(coffee, Negotiation::Offer { .. }));

        // The 8-minute-old attempt expires after two more minutes
        let later = now + Duration::minutes(3);
        let rice = policy().negotiate(&haggle("rice"), &store(), &ctx, later).unwrap();
        assert!(matches!(rice, Negotiation::Offer { .. }));
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let config = ResponseConfig {
            negotiation_window_secs: u64::MAX,
            ..Default::default()
        };
        let now = Utc::now();
        let mut ctx = ConversationContext::new("s1");
        for days_ago in [1, 5] {
            ctx.record_negotiation(NegotiationAttempt {
                product_id: "rice".to_string(),
                offered_price: 52.0,
                timestamp: now - Duration::days(days_ago),
            });
        }
        let rice = NegotiationPolicy::from_config(&config)
            .negotiate(&haggle("rice"), &store(), &ctx, now)
            .unwrap();
        assert!(matches!(rice, Negotiation::Declined { .. }));
    }
}
