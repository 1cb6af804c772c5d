//! Upsell suggestions
//!
//! A fixed pairing table ("coffee goes with sugar") with the first active
//! promotion as a fallback. Suggestions are rate-limited per session by a
//! rolling window over the recorded upsell attempts.

use chrono::{DateTime, Duration, Utc};

use sari_sari_config::ResponseConfig;
use sari_sari_core::{
    BusinessContext, ConversationContext, Intent, IntentKind, Product, UpsellAttempt,
};

use super::templates::{anchor_product, peso};

/// Anchor term -> suggested product term
const PAIRINGS: &[(&str, &str)] = &[
    ("coffee", "sugar"),
    ("kape", "sugar"),
    ("rice", "eggs"),
    ("bigas", "eggs"),
    ("noodles", "eggs"),
    ("bread", "peanut butter"),
    ("pandesal", "peanut butter"),
    ("sardines", "rice"),
    ("soda", "chips"),
    ("shampoo", "conditioner"),
    ("sugar", "coffee"),
    ("eggs", "bread"),
];

/// An upsell line and the attempt to record for it
#[derive(Debug, Clone, PartialEq)]
pub struct Upsell {
    pub text: String,
    pub attempt: UpsellAttempt,
}

#[derive(Debug, Clone)]
pub struct UpsellPolicy {
    enabled: bool,
    max_attempts: usize,
    window: Duration,
}

impl UpsellPolicy {
    pub fn from_config(config: &ResponseConfig) -> Self {
        Self {
            enabled: config.upsell_enabled,
            max_attempts: config.upsell_max_attempts,
            window: super::rolling_window(config.upsell_window_secs),
        }
    }

    pub fn applies_to(kind: IntentKind) -> bool {
        matches!(
            kind,
            IntentKind::AddToCart | IntentKind::ProductInquiry | IntentKind::PriceInquiry
        )
    }

    /// Cooldown check over the session's upsell history
    pub fn allowed(&self, context: &ConversationContext, now: DateTime<Utc>) -> bool {
        self.enabled && context.upsells_within(self.window, now) < self.max_attempts
    }

    pub fn suggest(
        &self,
        intent: &Intent,
        business: &BusinessContext,
        context: &ConversationContext,
        now: DateTime<Utc>,
    ) -> Option<Upsell> {
        if !Self::applies_to(intent.name) || !self.allowed(context, now) {
            return None;
        }

        let anchor = anchor_product(intent, business);
        let eligible = |p: &Product| {
            p.in_stock()
                && !business.cart_contains(&p.id)
                && anchor.map_or(true, |a| a.id != p.id)
                && !context.preferences.dislikes(&p.name)
        };

        let paired = anchor.and_then(|a| {
            PAIRINGS
                .iter()
                .filter(|(key, _)| a.matches(key))
                .filter_map(|(_, target)| business.find_product(target))
                .find(|p| eligible(*p))
                .map(|p| {
                    let text = format!(
                        "Would you like some {} to go with your {}? It's {} per {}.",
                        p.name,
                        a.name,
                        peso(p.price),
                        p.unit
                    );
                    (p, text)
                })
        });

        let (product, text) = paired.or_else(|| {
            business.promotions.iter().find_map(|promo| {
                business
                    .product_by_id(&promo.product_id)
                    .filter(|p| eligible(*p))
                    .map(|p| {
                        (
                            p,
                            format!(
                                "By the way, {} is on promo: {}.",
                                p.name,
                                promo.description.trim_end_matches('.')
                            ),
                        )
                    })
            })
        })?;

        tracing::debug!(product = %product.id, "Upsell suggested");
        Some(Upsell {
            text,
            attempt: UpsellAttempt {
                product_id: product.id.clone(),
                timestamp: now,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::fixtures::store;
    use sari_sari_core::{CartItem, Entity, EntityType};

    fn policy() -> UpsellPolicy {
        UpsellPolicy::from_config(&ResponseConfig::default())
    }

    fn asking_for(kind: IntentKind, name: &str) -> Intent {
        Intent::new(kind, 0.9).with_entities(vec![Entity::new(EntityType::ProductName, name, 0.9)])
    }

    #[test]
    fn test_pairing_table() {
        let ctx = ConversationContext::new("s1");
        let upsell = policy()
            .suggest(&asking_for(IntentKind::AddToCart, "coffee"), &store(), &ctx, Utc::now())
            .unwrap();
        assert_eq!(upsell.attempt.product_id, "sugar");
        assert!(upsell.text.contains("Sugar to go with your Coffee"));
    }

    #[test]
    fn test_promotion_fallback_skips_cart_items() {
        let mut business = store();
        let ctx = ConversationContext::new("s1");

        // Soap has no pairing; coffee is on promo
        let upsell = policy()
            .suggest(&asking_for(IntentKind::PriceInquiry, "soap"), &business, &ctx, Utc::now())
            .unwrap();
        assert_eq!(upsell.attempt.product_id, "coffee");
        assert!(upsell.text.starts_with("By the way, Coffee is on promo"));

        business.cart.push(CartItem {
            product_id: "coffee".to_string(),
            name: "Coffee".to_string(),
            quantity: 1,
            unit_price: 12.0,
        });
        assert!(policy()
            .suggest(&asking_for(IntentKind::PriceInquiry, "soap"), &business, &ctx, Utc::now())
            .is_none());
    }

    #[test]
    fn test_only_for_shopping_intents() {
        let ctx = ConversationContext::new("s1");
        for kind in [IntentKind::Greeting, IntentKind::ViewCart, IntentKind::NegotiationStart] {
            assert!(policy()
                .suggest(&asking_for(kind, "coffee"), &store(), &ctx, Utc::now())
                .is_none());
        }
    }

    #[test]
    fn test_cooldown_window() {
        let now = Utc::now();
        let mut ctx = ConversationContext::new("s1");
        for minutes_ago in [1, 3] {
            ctx.record_upsell(UpsellAttempt {
                product_id: "sugar".to_string(),
                timestamp: now - Duration::minutes(minutes_ago),
            });
        }
        let intent = asking_for(IntentKind::AddToCart, "rice");
        assert!(policy().suggest(&intent, &store(), &ctx, now).is_none());

        // Six minutes later the older attempt has left the window
        let later = now + Duration::minutes(3);
        assert!(policy().suggest(&intent, &store(), &ctx, later).is_some());
    }

    #[test]
    fn test_oversized_window_is_clamped() {
        let config = ResponseConfig {
            upsell_window_secs: 100_000_000_000_000_000,
            ..Default::default()
        };
        let now = Utc::now();
        let mut ctx = ConversationContext::new("s1");
        for days_ago in [2, 10] {
            ctx.record_upsell(UpsellAttempt {
                product_id: "sugar".to_string(),
                timestamp: now - Duration::days(days_ago),
            });
        }
        let intent = asking_for(IntentKind::AddToCart, "rice");
        assert!(UpsellPolicy::from_config(&config)
            .suggest(&intent, &store(), &ctx, now)
            .is_none());
    }

    #[test]
    fn test_disabled() {
        let config = ResponseConfig {
            upsell_enabled: false,
            ..Default::default()
        };
        let ctx = ConversationContext::new("s1");
        assert!(UpsellPolicy::from_config(&config)
            .suggest(&asking_for(IntentKind::AddToCart, "coffee"), &store(), &ctx, Utc::now())
            .is_none());
    }
}
